//! 텍스트 ↔ 벡터 코덱
//!
//! 문자마다 코드 포인트 값을 하나씩 쓰고 폭 N에 맞춰 패딩/절단한다.
//! 디코딩은 반올림 후 유효한 코드 포인트 범위로 클램프하는 손실 변환이며
//! 인코딩의 역함수가 아니다.

use crate::core::error::{PipelineError, Result};

/// 패딩 값
pub const PAD_VALUE: f64 = 0.0;

const MAX_CODE_POINT: f64 = char::MAX as u32 as f64;
const SURROGATES: std::ops::RangeInclusive<u32> = 0xD800..=0xDFFF;

/// 고정 폭 텍스트 코덱
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCodec {
    width: usize,
}

impl TextCodec {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// 텍스트를 길이 `width` 벡터로 변환
    pub fn encode(&self, text: &str) -> Result<Vec<f64>> {
        if text.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        let mut vector: Vec<f64> = text
            .chars()
            .take(self.width)
            .map(|c| c as u32 as f64)
            .collect();
        vector.resize(self.width, PAD_VALUE);
        Ok(vector)
    }

    /// 벡터를 최대 `original_length`자의 텍스트로 변환
    pub fn decode(&self, vector: &[f64], original_length: usize) -> String {
        vector
            .iter()
            .take(original_length)
            .map(|&value| value_to_char(value))
            .collect()
    }
}

fn value_to_char(value: f64) -> char {
    let code = if value.is_nan() {
        PAD_VALUE
    } else {
        value.round().clamp(0.0, MAX_CODE_POINT)
    };
    let code = code as u32;
    if SURROGATES.contains(&code) {
        return char::REPLACEMENT_CHARACTER;
    }
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}
