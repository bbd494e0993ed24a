//! # 파이프라인 에러 타입
//!
//! 코어 전체(유닛, 블록, 레이어 스토어, 파이프라인, 코덱)가 공유하는 에러

use thiserror::Error;

/// 코어 연산 에러
#[derive(Error, Debug)]
pub enum PipelineError {
    /// 입력 벡터 길이가 설정된 유닛 크기와 다름
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 윈도우 용량이 1 미만
    #[error("window capacity must be at least 1 (got {capacity})")]
    CapacityExceeded { capacity: usize },

    /// 저장된 상태가 현재 설정과 맞지 않음
    #[error("corrupt state: {0}")]
    CorruptState(String),

    /// 코덱에 빈 텍스트가 들어옴
    #[error("empty input")]
    EmptyInput,

    /// 플러시/구체화 중 I/O 실패
    #[error("storage failure while {context}: {source}")]
    StorageFailure {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// 잘못된 설정값
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// 유한하지 않은 피드백 값
    #[error("feedback must be finite (got {0})")]
    InvalidFeedback(f64),

    /// 블록 사이에서 패스가 중단됨
    #[error("pass cancelled after {completed} blocks")]
    Cancelled { completed: usize },
}

impl PipelineError {
    pub(crate) fn storage(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::StorageFailure {
            context: context.into(),
            source,
        }
    }

    /// 호출자가 입력을 고쳐서 다시 시도할 수 있는 에러인지
    pub fn is_caller_fixable(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. } | Self::EmptyInput)
    }
}

/// 코어 결과 타입
pub type Result<T> = std::result::Result<T, PipelineError>;
