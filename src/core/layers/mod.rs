//! # 레이어 모듈
//!
//! 유닛(아핀 변환)과 블록(유닛 묶음), 그리고 이들이 공유하는 시드 난수 스트림

pub mod random;
pub mod unit;
pub mod block;

pub use block::Block;
pub use random::{derive_seed, seeded_rng, FEEDBACK_DOMAIN, INIT_DOMAIN};
pub use unit::Unit;
