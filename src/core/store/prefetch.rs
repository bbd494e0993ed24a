//! 블록 프리페치
//!
//! 커서 앞쪽 최대 P개의 블록을 전용 스레드 풀에서 미리 구체화한다.
//! 결과는 인덱스별 채널로 돌려받고, 아직 준비되지 않았으면 받는 쪽이 기다린다.

use crate::core::config::BlockShape;
use crate::core::error::{PipelineError, Result};
use crate::core::layers::Block;
use crate::core::store::spill::BlockSpill;
use log::debug;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver};
use std::sync::Arc;

/// 블록이 어디서 왔는지
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// 시드로 새로 초기화
    Fresh,
    /// 보관소에서 복원
    Restored,
}

/// 블록 하나를 구체화 (보관소 우선, 없으면 시드로 새로 생성)
pub fn materialize(
    index: usize,
    shape: BlockShape,
    seed: u64,
    spill: &dyn BlockSpill,
) -> Result<(Block, Origin)> {
    match spill.fetch(index)? {
        Some(block) => {
            block.validate(index, shape)?;
            Ok((block, Origin::Restored))
        }
        None => Ok((Block::fresh(index, shape, seed), Origin::Fresh)),
    }
}

struct InFlight {
    rx: Receiver<Result<(Block, Origin)>>,
    cancelled: Arc<AtomicBool>,
}

/// 프리페치 작업 관리자
pub(crate) struct Prefetcher {
    pool: Option<rayon::ThreadPool>,
    shape: BlockShape,
    seed: u64,
    spill: Arc<dyn BlockSpill>,
    in_flight: BTreeMap<usize, InFlight>,
}

impl Prefetcher {
    pub(crate) fn new(
        depth: usize,
        shape: BlockShape,
        seed: u64,
        spill: Arc<dyn BlockSpill>,
    ) -> Result<Self> {
        let pool = if depth == 0 {
            None
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(depth)
                .thread_name(|i| format!("nbas-prefetch-{}", i))
                .build()
                .map_err(|e| PipelineError::InvalidConfig(format!("prefetch pool: {}", e)))?;
            Some(pool)
        };
        Ok(Self {
            pool,
            shape,
            seed,
            spill,
            in_flight: BTreeMap::new(),
        })
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    pub(crate) fn is_in_flight(&self, index: usize) -> bool {
        self.in_flight.contains_key(&index)
    }

    pub(crate) fn in_flight(&self) -> Vec<usize> {
        self.in_flight.keys().copied().collect()
    }

    /// 인덱스 하나 프리페치 시작 (이미 진행 중이면 무시)
    pub(crate) fn schedule(&mut self, index: usize) {
        let Some(pool) = &self.pool else {
            return;
        };
        if self.in_flight.contains_key(&index) {
            return;
        }

        let (tx, rx) = sync_channel(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let spill = Arc::clone(&self.spill);
        let shape = self.shape;
        let seed = self.seed;

        pool.spawn(move || {
            if flag.load(Ordering::Acquire) {
                return;
            }
            let result = materialize(index, shape, seed, spill.as_ref());
            // 취소되었다면 수신자가 이미 사라졌을 수 있음
            tx.send(result).ok();
        });

        debug!("prefetch scheduled for block {}", index);
        self.in_flight.insert(index, InFlight { rx, cancelled });
    }

    /// 진행 중인 프리페치 결과를 기다려 가져옴
    ///
    /// 프리페치가 없었거나 작업이 결과를 보내지 못했으면 `None`
    pub(crate) fn wait(&mut self, index: usize) -> Option<Result<(Block, Origin)>> {
        let job = self.in_flight.remove(&index)?;
        match job.rx.recv() {
            Ok(result) => Some(result),
            Err(_) => {
                debug!("prefetch for block {} produced no result", index);
                None
            }
        }
    }

    /// `index` 미만의 프리페치 취소
    pub(crate) fn cancel_below(&mut self, index: usize) {
        let keep = self.in_flight.split_off(&index);
        let stale = std::mem::replace(&mut self.in_flight, keep);
        for (_, job) in stale {
            job.cancelled.store(true, Ordering::Release);
        }
    }

    /// 모든 프리페치 취소
    pub(crate) fn cancel_all(&mut self) {
        for (_, job) in std::mem::take(&mut self.in_flight) {
            job.cancelled.store(true, Ordering::Release);
        }
    }
}

impl Drop for Prefetcher {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
