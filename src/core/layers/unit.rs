//! 유닛 - 단일 아핀 변환 (가중치 행렬 + 편향)

use crate::core::error::{PipelineError, Result};
use crate::core::layers::random::{standard_normal_matrix, standard_normal_vector};
use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 아핀 변환 유닛
///
/// `forward`는 `input · weights + bias`를 계산한다.
/// `perturb`는 학습이 아니다. 피드백에 비례하는 무작위 잡음을 가중치에 더하는
/// 확률적 드리프트 규칙이며, 기울기를 전혀 계산하지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    size: usize,
    weights: Array2<f64>,
    bias: Array1<f64>,
    scale: f64,
}

impl Unit {
    /// 무작위 초기화된 유닛 생성
    ///
    /// 가중치는 `scale`배 된 표준정규 샘플, 편향은 스케일 없는 표준정규 샘플
    pub fn random<R: Rng + ?Sized>(size: usize, scale: f64, rng: &mut R) -> Self {
        let weights = standard_normal_matrix(rng, size, scale);
        let bias = standard_normal_vector(rng, size);
        Self {
            size,
            weights,
            bias,
            scale,
        }
    }

    /// 주어진 가중치/편향으로 유닛 생성 (형상 검증 포함)
    pub fn from_parts(weights: Array2<f64>, bias: Array1<f64>, scale: f64) -> Result<Self> {
        let unit = Self {
            size: bias.len(),
            weights,
            bias,
            scale,
        };
        unit.check_shape(unit.size)?;
        Ok(unit)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn bias(&self) -> &Array1<f64> {
        &self.bias
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// 순전파: `input · weights + bias`
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        Ok(self.forward_view(ArrayView1::from(input))?.to_vec())
    }

    /// ndarray 뷰 기반 순전파 (블록 내부 접기에서 사용)
    pub fn forward_view(&self, input: ArrayView1<f64>) -> Result<Array1<f64>> {
        if input.len() != self.size {
            return Err(PipelineError::DimensionMismatch {
                expected: self.size,
                actual: input.len(),
            });
        }
        Ok(input.dot(&self.weights) + &self.bias)
    }

    /// 피드백 스케일 잡음을 가중치에 더함 (편향은 건드리지 않음)
    pub fn perturb<R: Rng + ?Sized>(&mut self, feedback: f64, rng: &mut R) {
        if feedback == 0.0 {
            return;
        }
        let noise = standard_normal_matrix(rng, self.size, 1.0);
        self.weights.scaled_add(feedback, &noise);
    }

    /// 역직렬화된 유닛의 형상이 기대 크기와 일치하는지 확인
    pub fn check_shape(&self, expected: usize) -> Result<()> {
        let (rows, cols) = self.weights.dim();
        if self.size != expected || rows != expected || cols != expected || self.bias.len() != expected {
            return Err(PipelineError::CorruptState(format!(
                "unit shape mismatch: expected size {}, found size {} with weights {}x{} and bias {}",
                expected,
                self.size,
                rows,
                cols,
                self.bias.len()
            )));
        }
        Ok(())
    }

    /// 메모리 사용량 (bytes)
    pub fn memory_usage(&self) -> usize {
        (self.weights.len() + self.bias.len()) * std::mem::size_of::<f64>()
    }
}
