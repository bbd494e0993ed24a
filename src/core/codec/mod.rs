//! # 코덱 모듈
//!
//! 파이프라인 경계에서 텍스트와 고정 폭 수치 벡터를 변환

pub mod text_codec;

pub use text_codec::{TextCodec, PAD_VALUE};

#[cfg(test)]
pub mod __tests__;
