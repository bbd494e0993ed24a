//! 파이프라인 (모델)
//!
//! 레이어 스토어에서 블록을 순서대로 받아 순전파하고, 피드백을 마지막 패스에서 지나간 블록에 적용하며,
//! 현재 윈도우의 저장/복원을 담당한다.

use crate::core::config::PipelineConfig;
use crate::core::error::{PipelineError, Result};
use crate::core::layers::{derive_seed, FEEDBACK_DOMAIN};
use crate::core::pipeline::cancel::CancelToken;
use crate::core::pipeline::snapshot::{PipelineSnapshot, Snapshot, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
use crate::core::store::{BlockSpill, LayerStore};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;

/// 윈도우 기반 아핀 파이프라인
pub struct Pipeline {
    config: PipelineConfig,
    store: LayerStore,
    touched: Vec<usize>,
    feedback_rounds: u64,
}

impl Pipeline {
    /// 설정으로 파이프라인 생성
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let store = LayerStore::new(&config)?;
        Ok(Self::from_parts(config, store))
    }

    /// 외부 보관소를 쓰는 파이프라인 생성
    pub fn with_spill(config: PipelineConfig, spill: Arc<dyn BlockSpill>) -> Result<Self> {
        let store = LayerStore::with_spill(&config, spill)?;
        Ok(Self::from_parts(config, store))
    }

    fn from_parts(config: PipelineConfig, store: LayerStore) -> Self {
        Self {
            config,
            store,
            touched: Vec::new(),
            feedback_rounds: 0,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 읽기 전용 스토어 접근
    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    /// 마지막 forward에서 지나간 블록 인덱스들
    pub fn touched(&self) -> &[usize] {
        &self.touched
    }

    /// 지금까지 적용된 피드백 라운드 수
    pub fn feedback_rounds(&self) -> u64 {
        self.feedback_rounds
    }

    pub fn declared_total(&self) -> usize {
        self.store.declared_total()
    }

    /// 설정된 패스 깊이만큼 순전파
    pub fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.run_pass(input, self.config.pass_depth, None)
    }

    /// 지정한 깊이만큼 순전파 (선언 깊이를 넘지 않음)
    pub fn forward_to_depth(&mut self, input: &[f64], depth: usize) -> Result<Vec<f64>> {
        self.run_pass(input, depth, None)
    }

    /// 블록 사이마다 `cancel`을 확인하며 순전파
    ///
    /// 중단되면 `Cancelled`를 돌려주고 윈도우는 도달한 상태 그대로 남는다.
    pub fn forward_with_cancel(
        &mut self,
        input: &[f64],
        depth: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<f64>> {
        self.run_pass(input, depth, Some(cancel))
    }

    fn run_pass(&mut self, input: &[f64], depth: usize, cancel: Option<&CancelToken>) -> Result<Vec<f64>> {
        if input.len() != self.config.unit_size {
            return Err(PipelineError::DimensionMismatch {
                expected: self.config.unit_size,
                actual: input.len(),
            });
        }
        let depth = depth.min(self.store.declared_total());

        self.touched.clear();
        self.store.begin_pass(depth);

        let mut state = input.to_vec();
        for completed in 0..depth {
            if cancel.map_or(false, CancelToken::is_cancelled) {
                debug!("pass cancelled after {} blocks", completed);
                return Err(PipelineError::Cancelled { completed });
            }
            let block = self.store.next_in_order()?;
            state = block.forward(&state)?;
            self.touched.push(block.index());
        }
        Ok(state)
    }

    /// 마지막 패스에서 지나간 블록들에 피드백 섭동 적용
    ///
    /// 학습이 아니라 확률적 드리프트다. 윈도우에서 밀려난 블록은 보관소에서 꺼내 섭동한다.
    /// 보관소가 없으면(`Discard`) 밀려난 블록은 남아 있는 상태가 없으므로 건너뛴다.
    /// 실패하면 어떤 블록도 바뀌지 않고 라운드 카운터도 그대로다.
    /// 실제로 섭동된 블록 수를 반환한다.
    pub fn apply_feedback(&mut self, feedback: f64) -> Result<usize> {
        if !feedback.is_finite() {
            return Err(PipelineError::InvalidFeedback(feedback));
        }
        if self.touched.is_empty() {
            return Ok(0);
        }

        let round_seed = derive_seed(derive_seed(self.config.seed, FEEDBACK_DOMAIN), self.feedback_rounds);
        let seed_for = move |index: usize| derive_seed(round_seed, index as u64);

        // 보관소 쪽을 먼저 처리해야 실패 시 윈도우가 그대로 남는다
        let mut perturbed = self.store.perturb_evicted(&self.touched, feedback, seed_for)?;
        for &index in &self.touched {
            if self.store.perturb(index, feedback, seed_for(index)) {
                perturbed += 1;
            } else if !self.store.spill().is_durable() {
                debug!("block {} was discarded, feedback skipped", index);
            }
        }
        self.feedback_rounds += 1;
        Ok(perturbed)
    }

    /// 현재 윈도우와 깊이 카운터를 파일로 저장
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
            declared_total: self.store.declared_total(),
            units_per_block: self.config.units_per_block,
            unit_size: self.config.unit_size,
            seed: self.config.seed,
            cursor: self.store.cursor(),
            feedback_rounds: self.feedback_rounds,
            window_start: self.store.window_start(),
            blocks: self.store.resident_blocks().collect(),
        };
        snapshot.write_to(path)?;
        info!(
            "saved window {:?} ({} blocks) to {}",
            snapshot.window(),
            snapshot.blocks.len(),
            path.display()
        );
        Ok(())
    }

    /// 파일에서 윈도우와 깊이 카운터 복원
    ///
    /// 설정과 맞지 않으면 `CorruptState`를 돌려주고 아무것도 바꾸지 않는다.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let snapshot = PipelineSnapshot::read_from(path)?;

        if snapshot.unit_size != self.config.unit_size {
            return Err(PipelineError::CorruptState(format!(
                "snapshot unit size {} does not match configured {}",
                snapshot.unit_size, self.config.unit_size
            )));
        }
        if snapshot.units_per_block != self.config.units_per_block {
            return Err(PipelineError::CorruptState(format!(
                "snapshot holds {} units per block, configured {}",
                snapshot.units_per_block, self.config.units_per_block
            )));
        }
        if snapshot.seed != self.config.seed {
            warn!(
                "snapshot seed {} differs from configured seed {}; blocks outside the window will not match",
                snapshot.seed, self.config.seed
            );
        }

        let window = snapshot.window();
        self.store
            .restore(snapshot.window_start, snapshot.blocks, snapshot.cursor)?;
        self.store.set_declared_total(snapshot.declared_total);
        self.feedback_rounds = snapshot.feedback_rounds;
        self.touched.clear();

        info!("loaded window {:?} from {}", window, path.display());
        Ok(())
    }

    /// 상주 블록 메모리 사용량 (bytes)
    pub fn resident_memory(&self) -> usize {
        self.store.resident_blocks().map(|b| b.memory_usage()).sum()
    }
}
