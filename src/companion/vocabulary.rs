//! 어휘 목록 - 줄 단위 텍스트 파일에 보관되는 순서 있는 고유 단어 목록

use anyhow::{Context, Result};
use log::info;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// 학습된 단어 목록
#[derive(Debug, Clone)]
pub struct Vocabulary {
    path: PathBuf,
    words: Vec<String>,
    seen: HashSet<String>,
}

impl Vocabulary {
    /// 파일에서 어휘 로드 (파일이 없으면 빈 목록)
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let words: Vec<String> = if path.exists() {
            fs::read_to_string(&path)
                .with_context(|| format!("어휘 파일을 읽을 수 없습니다: {}", path.display()))?
                .lines()
                .map(str::to_owned)
                .collect()
        } else {
            Vec::new()
        };

        let mut vocabulary = Self {
            path,
            words: Vec::with_capacity(words.len()),
            seen: HashSet::with_capacity(words.len()),
        };
        for word in words {
            vocabulary.insert(word);
        }
        Ok(vocabulary)
    }

    fn insert(&mut self, word: String) -> bool {
        if word.is_empty() || self.seen.contains(&word) {
            return false;
        }
        self.seen.insert(word.clone());
        self.words.push(word);
        true
    }

    /// 처음 보는 단어들을 추가하고 새로 배운 단어를 순서대로 반환
    pub fn learn(&mut self, text: &str) -> Vec<String> {
        let mut learned = Vec::new();
        for word in text.split_whitespace() {
            if self.insert(word.to_owned()) {
                info!("learned new word: {}", word);
                learned.push(word.to_owned());
            }
        }
        learned
    }

    pub fn contains(&self, word: &str) -> bool {
        self.seen.contains(word)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 파일에 한 줄에 한 단어씩 저장
    pub fn save(&self) -> Result<()> {
        let mut contents = String::new();
        for word in &self.words {
            contents.push_str(word);
            contents.push('\n');
        }
        fs::write(&self.path, contents)
            .with_context(|| format!("어휘 파일을 저장할 수 없습니다: {}", self.path.display()))
    }
}
