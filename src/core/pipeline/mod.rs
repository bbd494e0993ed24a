//! # 파이프라인 모듈
//!
//! 순전파/피드백/저장 프로토콜과 스냅샷 포맷

pub mod cancel;
pub mod snapshot;
pub mod model;

pub use cancel::CancelToken;
pub use model::Pipeline;
pub use snapshot::{PipelineSnapshot, Snapshot, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};

#[cfg(test)]
pub mod __tests__;
