//! 윈도우 기반 레이어 스토어
//!
//! 논리적으로 거의 무한한 블록 수열을 인덱스로 제공하되, 실제로 메모리에 올라가는
//! 블록은 용량 W의 연속 윈도우로 제한한다.
//!
//! - 윈도우 안의 인덱스: 그대로 반환
//! - 윈도우 뒤쪽 인덱스: 윈도우를 앞으로 밀고, 밀려난 블록은 FIFO로 보관소에 플러시
//! - 윈도우 앞쪽 인덱스(새 패스 시작)나 윈도우와 이어지지 않는 먼 인덱스:
//!   윈도우 전체를 플러시하고 그 인덱스 하나로 다시 시작
//!
//! 한 패스 안에서 접근 순서는 단조 증가하므로 LRU 기록 없이 FIFO 축출로 충분하다.
//! 들어오는 블록의 구체화와 나가는 블록의 플러시가 모두 성공해야 윈도우가 바뀐다.

use crate::core::config::{BlockShape, PipelineConfig};
use crate::core::error::{PipelineError, Result};
use crate::core::layers::Block;
use crate::core::store::prefetch::{materialize, Origin, Prefetcher};
use crate::core::store::spill::{create_spill, BlockSpill};
use log::{debug, warn};
use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Arc;

/// 스토어 통계
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// 시드로 새로 만든 블록 수
    pub fresh: u64,
    /// 보관소에서 복원한 블록 수
    pub restored: u64,
    /// 프리페치로 준비되어 있던 블록 수
    pub prefetch_hits: u64,
    /// 호출 스레드에서 직접 구체화한 블록 수
    pub sync_loads: u64,
    /// 윈도우에서 밀려난 블록 수
    pub evictions: u64,
    /// 보관소에 기록된 블록 수
    pub flushes: u64,
}

/// 윈도우 기반 레이어 스토어
pub struct LayerStore {
    shape: BlockShape,
    seed: u64,
    capacity: usize,
    prefetch_depth: usize,
    declared_total: usize,
    window_start: usize,
    window: VecDeque<Block>,
    cursor: usize,
    pass_limit: Option<usize>,
    spill: Arc<dyn BlockSpill>,
    prefetcher: Prefetcher,
    stats: StoreStats,
}

impl LayerStore {
    /// 설정의 보관 전략으로 스토어 생성
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let spill = create_spill(&config.spill)?;
        Self::with_spill(config, spill)
    }

    /// 외부에서 만든 보관소로 스토어 생성
    pub fn with_spill(config: &PipelineConfig, spill: Arc<dyn BlockSpill>) -> Result<Self> {
        config.validate()?;
        let shape = config.block_shape();
        let prefetcher = Prefetcher::new(config.prefetch_depth, shape, config.seed, Arc::clone(&spill))?;
        Ok(Self {
            shape,
            seed: config.seed,
            capacity: config.window_capacity,
            prefetch_depth: config.prefetch_depth,
            declared_total: config.declared_total,
            window_start: 0,
            window: VecDeque::with_capacity(config.window_capacity),
            cursor: 0,
            pass_limit: None,
            spill,
            prefetcher,
            stats: StoreStats::default(),
        })
    }

    pub fn shape(&self) -> BlockShape {
        self.shape
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn prefetch_depth(&self) -> usize {
        self.prefetch_depth
    }

    /// 선언된 논리 깊이 (권고값)
    pub fn declared_total(&self) -> usize {
        self.declared_total
    }

    pub(crate) fn set_declared_total(&mut self, declared_total: usize) {
        self.declared_total = declared_total;
    }

    /// 현재 윈도우 인덱스 범위 (비어 있으면 빈 범위)
    pub fn window(&self) -> Range<usize> {
        self.window_start..self.window_start + self.window.len()
    }

    /// 윈도우 시작 인덱스
    pub fn window_start(&self) -> usize {
        self.window_start
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn is_resident(&self, index: usize) -> bool {
        self.window().contains(&index)
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        if self.is_resident(index) {
            self.window.get(index - self.window_start)
        } else {
            None
        }
    }

    /// 윈도우 안의 블록들 (인덱스 오름차순)
    pub fn resident_blocks(&self) -> impl Iterator<Item = &Block> {
        self.window.iter()
    }

    /// 순차 커서 위치 (다음에 `next_in_order`가 반환할 인덱스)
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    pub fn spill(&self) -> &Arc<dyn BlockSpill> {
        &self.spill
    }

    /// 진행 중인 프리페치 인덱스들
    pub fn in_flight(&self) -> Vec<usize> {
        self.prefetcher.in_flight()
    }

    /// 블록 `index`가 윈도우에 올라와 있도록 보장
    ///
    /// `declared_total` 이상의 인덱스도 거부하지 않는다.
    pub fn ensure(&mut self, index: usize) -> Result<&Block> {
        if !self.is_resident(index) {
            self.advance_to(index)?;
        }
        Ok(&self.window[index - self.window_start])
    }

    /// 커서 위치의 블록을 보장하고 커서를 하나 전진, 이후 블록들을 프리페치
    pub fn next_in_order(&mut self) -> Result<&Block> {
        let index = self.cursor;
        if !self.is_resident(index) {
            self.advance_to(index)?;
        }
        self.cursor = index + 1;
        self.schedule_prefetch(index);
        Ok(&self.window[index - self.window_start])
    }

    /// 새 패스 시작: 커서를 0으로 되돌리고 프리페치 상한을 `limit`으로 제한
    pub fn begin_pass(&mut self, limit: usize) {
        self.prefetcher.cancel_all();
        self.cursor = 0;
        self.pass_limit = Some(limit);
    }

    /// 윈도우는 그대로 두고 커서만 이동
    pub fn seek(&mut self, cursor: usize) {
        self.prefetcher.cancel_all();
        self.cursor = cursor;
    }

    /// 윈도우 안의 블록 섭동. 윈도우 밖이면 `false`
    pub fn perturb(&mut self, index: usize, feedback: f64, seed: u64) -> bool {
        if !self.is_resident(index) {
            return false;
        }
        let offset = index - self.window_start;
        self.window[offset].perturb_all(feedback, seed);
        true
    }

    /// 윈도우 밖으로 밀려난 블록들을 보관소에서 꺼내 섭동한 뒤 다시 기록
    ///
    /// `seed_for`는 블록 인덱스별 섭동 시드다. 기록 도중 실패하면 이미 덮어쓴 블록을
    /// 원래 값으로 되돌리고 에러를 돌려준다. 보관소가 데이터를 보존하지 않으면 0을 반환한다.
    pub fn perturb_evicted<F>(&mut self, indices: &[usize], feedback: f64, seed_for: F) -> Result<usize>
    where
        F: Fn(usize) -> u64,
    {
        if !self.spill.is_durable() {
            return Ok(0);
        }
        let evicted: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&index| !self.is_resident(index))
            .collect();
        if evicted.is_empty() {
            return Ok(0);
        }
        // 섭동 전 상태를 읽었을 수 있는 프리페치 결과는 버림
        self.prefetcher.cancel_all();
        if feedback == 0.0 {
            return Ok(evicted.len());
        }

        let mut originals = Vec::with_capacity(evicted.len());
        for &index in &evicted {
            let (block, _) = materialize(index, self.shape, self.seed, self.spill.as_ref())?;
            originals.push(block);
        }
        for (written, original) in originals.iter().enumerate() {
            let mut updated = original.clone();
            updated.perturb_all(feedback, seed_for(original.index()));
            if let Err(e) = self.spill.store(&updated) {
                self.roll_back_spill(&originals[..written]);
                return Err(e);
            }
        }

        self.stats.flushes += originals.len() as u64;
        debug!("feedback applied to {} spilled blocks", originals.len());
        Ok(originals.len())
    }

    fn roll_back_spill(&self, originals: &[Block]) {
        for block in originals {
            if let Err(e) = self.spill.store(block) {
                warn!("could not restore spilled block {}: {}", block.index(), e);
            }
        }
    }

    /// 윈도우는 유지한 채 모든 상주 블록을 보관소에 기록
    pub fn flush_all(&mut self) -> Result<()> {
        if !self.spill.is_durable() {
            return Ok(());
        }
        for block in &self.window {
            self.spill.store(block)?;
        }
        self.stats.flushes += self.window.len() as u64;
        Ok(())
    }

    /// 검증된 블록들로 윈도우를 교체 (스냅샷 로드용)
    ///
    /// 검증에 실패하면 기존 윈도우는 그대로 남는다.
    pub fn restore(&mut self, window_start: usize, blocks: Vec<Block>, cursor: usize) -> Result<()> {
        if blocks.len() > self.capacity {
            return Err(PipelineError::CorruptState(format!(
                "stored window holds {} blocks but capacity is {}",
                blocks.len(),
                self.capacity
            )));
        }
        for (offset, block) in blocks.iter().enumerate() {
            block.validate(window_start + offset, self.shape)?;
        }

        self.prefetcher.cancel_all();
        self.window = blocks.into();
        self.window_start = window_start;
        self.cursor = cursor;
        self.pass_limit = None;
        debug!("window restored to {:?}", self.window());
        Ok(())
    }

    fn schedule_prefetch(&mut self, consumed: usize) {
        if !self.prefetcher.is_enabled() {
            return;
        }
        let limit = self.pass_limit.unwrap_or(self.declared_total);
        let last = consumed.saturating_add(self.prefetch_depth);
        for index in consumed + 1..=last {
            if index >= limit {
                break;
            }
            if self.is_resident(index) || self.prefetcher.is_in_flight(index) {
                continue;
            }
            self.prefetcher.schedule(index);
        }
    }

    /// 윈도우를 `index`가 포함되도록 이동
    fn advance_to(&mut self, index: usize) -> Result<()> {
        // 뒤로 가거나, 새 윈도우가 기존 윈도우와 이어지지 않으면 처음부터 다시 채움
        let end = self.window_start + self.window.len();
        let restart = self.window.is_empty()
            || index < self.window_start
            || index + 1 > end + self.capacity;
        let (new_start, evict_count, first_incoming) = if restart {
            (index, self.window.len(), index)
        } else {
            let new_start = self.window_start.max((index + 1).saturating_sub(self.capacity));
            (new_start, new_start - self.window_start, end)
        };

        let shape = self.shape;
        let seed = self.seed;
        let durable = self.spill.is_durable();
        let spill = self.spill.as_ref();
        let prefetcher = &mut self.prefetcher;
        let outgoing: Vec<&Block> = self.window.iter().take(evict_count).collect();

        // 나가는 블록 플러시와 들어오는 블록 구체화를 동시에 진행
        let (flushed, incoming) = rayon::join(
            || -> Result<()> {
                if durable {
                    for block in &outgoing {
                        spill.store(block)?;
                    }
                }
                Ok(())
            },
            || -> Result<Vec<(Block, Origin, bool)>> {
                (first_incoming..=index)
                    .map(|i| match prefetcher.wait(i) {
                        Some(result) => result.map(|(block, origin)| (block, origin, true)),
                        None => materialize(i, shape, seed, spill).map(|(block, origin)| (block, origin, false)),
                    })
                    .collect()
            },
        );
        flushed?;
        let incoming = incoming?;

        // 커밋
        if restart {
            self.prefetcher.cancel_all();
        }
        let previous = self.window();
        self.window.drain(..evict_count);
        self.window_start = new_start;
        for (block, origin, prefetched) in incoming {
            match origin {
                Origin::Fresh => self.stats.fresh += 1,
                Origin::Restored => self.stats.restored += 1,
            }
            if prefetched {
                self.stats.prefetch_hits += 1;
            } else {
                self.stats.sync_loads += 1;
            }
            self.window.push_back(block);
        }
        self.stats.evictions += evict_count as u64;
        if durable {
            self.stats.flushes += evict_count as u64;
        }
        self.prefetcher.cancel_below(self.window_start);

        debug!(
            "window {:?} -> {:?} (evicted {}, requested {})",
            previous,
            self.window(),
            evict_count,
            index
        );
        Ok(())
    }
}
