//! 사용자 프로필 - 대화 내용을 누적하는 자유 텍스트

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 프로필 파일이 없을 때의 기본 텍스트
pub const EMPTY_PROFILE: &str = "User profile data is empty.";

#[derive(Debug, Clone)]
pub struct UserProfile {
    path: PathBuf,
    text: String,
}

impl UserProfile {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = if path.exists() {
            fs::read_to_string(&path)
                .with_context(|| format!("프로필 파일을 읽을 수 없습니다: {}", path.display()))?
        } else {
            EMPTY_PROFILE.to_owned()
        };
        Ok(Self { path, text })
    }

    /// 사용자 발화 기록
    pub fn record(&mut self, said: &str) {
        self.text.push_str("\nUser said: ");
        self.text.push_str(said);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, &self.text)
            .with_context(|| format!("프로필 파일을 저장할 수 없습니다: {}", self.path.display()))
    }
}
