//! # 레이어 스토어 모듈
//!
//! 제한된 윈도우만 구체화하는 블록 저장소와 축출 블록 보관소, 프리페치

pub mod spill;
pub mod prefetch;
pub mod layer_store;

pub use layer_store::{LayerStore, StoreStats};
pub use prefetch::{materialize, Origin};
pub use spill::{create_spill, BlockSpill, DiscardSpill, DiskSpill, MemorySpill, SpillStats};

#[cfg(test)]
pub mod __tests__;
