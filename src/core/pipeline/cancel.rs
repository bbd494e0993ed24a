//! 패스 중단 토큰

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 다른 스레드에서 진행 중인 패스를 블록 경계에서 멈추게 하는 핸들
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}
