//! NBAS 파이프라인 라이브러리
//!
//! 선언 깊이는 수천만 블록이지만 실제로는 고정 크기 윈도우만 메모리에 두는 적응형 아핀 파이프라인과,
//! 이를 텍스트 대화에 쓰는 컴패니언 모듈

pub mod core;
pub mod companion;

// 핵심 타입들 재수출
pub use core::{
    Block, BlockShape, BlockSpill, CancelToken, LayerStore, Pipeline, PipelineConfig,
    PipelineError, Result, SpillStrategy, StoreStats, TextCodec, Unit,
};
pub use companion::{Reply, Session, SessionPaths};
