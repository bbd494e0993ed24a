//! # 코어 모듈
//!
//! 선언 깊이는 거대하지만 실제로는 제한된 윈도우만 구체화하는 적응형 아핀 파이프라인

pub mod error;
pub mod config;
pub mod layers;
pub mod store;
pub mod pipeline;
pub mod codec;

// 주요 타입들 재수출
pub use error::{PipelineError, Result};
pub use config::{BlockShape, PipelineConfig, SpillStrategy};
pub use layers::{Block, Unit};
pub use store::{BlockSpill, LayerStore, StoreStats};
pub use pipeline::{CancelToken, Pipeline};
pub use codec::TextCodec;
