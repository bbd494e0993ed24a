//! 블록 (슈퍼 레이어) - 고정 개수 유닛의 순차 합성
//!
//! 블록은 레이어 스토어의 구체화/축출 단위다.

use crate::core::config::BlockShape;
use crate::core::error::{PipelineError, Result};
use crate::core::layers::random::{derive_seed, seeded_rng, INIT_DOMAIN};
use crate::core::layers::unit::Unit;
use ndarray::ArrayView1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// 순서가 있는 유닛 묶음
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    index: usize,
    units: Vec<Unit>,
}

impl Block {
    /// 시드로부터 새 블록 구체화
    ///
    /// 같은 (시드, 인덱스)는 항상 같은 가중치를 만든다. 어떤 순서로 구체화되든 상관없다.
    pub fn fresh(index: usize, shape: BlockShape, seed: u64) -> Self {
        let mut rng = seeded_rng(derive_seed(seed, INIT_DOMAIN), index as u64);
        let units = (0..shape.units_per_block)
            .map(|_| Unit::random(shape.unit_size, shape.init_scale, &mut rng))
            .collect();
        Self { index, units }
    }

    /// 이미 만들어진 유닛들로 블록 구성
    pub fn from_units(index: usize, units: Vec<Unit>) -> Self {
        Self { index, units }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 입력을 각 유닛에 차례로 통과시킴
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        let mut iter = self.units.iter();
        let first = match iter.next() {
            Some(unit) => unit.forward_view(ArrayView1::from(input))?,
            None => return Ok(input.to_vec()),
        };
        let output = iter.try_fold(first, |state, unit| unit.forward_view(state.view()))?;
        Ok(output.to_vec())
    }

    /// 모든 유닛을 같은 피드백으로 섭동
    ///
    /// 유닛마다 `seed`에서 분기한 독립 스트림을 쓰므로 병렬 실행 순서와 무관하게 결과가 같다.
    pub fn perturb_all(&mut self, feedback: f64, seed: u64) {
        if feedback == 0.0 {
            return;
        }
        self.units
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, unit)| {
                let mut rng = seeded_rng(seed, i as u64);
                unit.perturb(feedback, &mut rng);
            });
    }

    /// 역직렬화된 블록 검증
    pub fn validate(&self, expected_index: usize, shape: BlockShape) -> Result<()> {
        if self.index != expected_index {
            return Err(PipelineError::CorruptState(format!(
                "block index mismatch: expected {}, found {}",
                expected_index, self.index
            )));
        }
        if self.units.len() != shape.units_per_block {
            return Err(PipelineError::CorruptState(format!(
                "block {} has {} units, expected {}",
                self.index,
                self.units.len(),
                shape.units_per_block
            )));
        }
        for unit in &self.units {
            unit.check_shape(shape.unit_size)?;
        }
        Ok(())
    }

    /// 메모리 사용량 (bytes)
    pub fn memory_usage(&self) -> usize {
        self.units.iter().map(Unit::memory_usage).sum()
    }
}
