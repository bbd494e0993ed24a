//! # 컴패니언 모듈
//!
//! 코어 파이프라인을 사용하는 텍스트 대화 협력자. 코어는 이 모듈에 의존하지 않는다.

pub mod vocabulary;
pub mod profile;
pub mod emotion;
pub mod session;

pub use emotion::{remark_for, EmotionTracker, Mood};
pub use profile::{UserProfile, EMPTY_PROFILE};
pub use session::{Reply, Session, SessionPaths};
pub use vocabulary::Vocabulary;
