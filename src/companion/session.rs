//! 대화 세션 - 코어 파이프라인을 감싸는 외부 협력자
//!
//! 텍스트 입력마다 어휘를 배우고, 프로필에 기록하고, 감정 카운터를 갱신한 뒤
//! 코덱 → 파이프라인 → 코덱으로 응답 텍스트를 만들고 피드백을 적용한다.

use crate::companion::emotion::{remark_for, EmotionTracker, Mood};
use crate::companion::profile::UserProfile;
use crate::companion::vocabulary::Vocabulary;
use crate::core::{Pipeline, PipelineConfig, PipelineError, SpillStrategy, TextCodec};
use anyhow::{Context, Result};
use log::{error, info};
use std::path::{Path, PathBuf};

/// 세션이 읽고 쓰는 파일 위치
#[derive(Debug, Clone)]
pub struct SessionPaths {
    pub state: PathBuf,
    pub vocabulary: PathBuf,
    pub profile: PathBuf,
    /// 윈도우에서 밀려난 블록을 보관할 디렉토리
    pub blocks: PathBuf,
}

impl SessionPaths {
    /// 상태 파일 옆 `<state>.blocks` 디렉토리
    pub fn blocks_beside(state: &Path) -> PathBuf {
        state.with_extension("blocks")
    }
}

impl Default for SessionPaths {
    fn default() -> Self {
        Self {
            state: PathBuf::from("model_state.bin"),
            vocabulary: PathBuf::from("vocabulary.txt"),
            profile: PathBuf::from("user_profile.txt"),
            blocks: PathBuf::from("model_state.blocks"),
        }
    }
}

/// 한 번의 대화 응답
#[derive(Debug, Clone)]
pub struct Reply {
    /// 파이프라인을 통과한 텍스트 (빈 입력이면 빈 문자열)
    pub transformed: String,
    /// 디코딩 전 파이프라인 출력 벡터
    pub output: Vec<f64>,
    /// 키워드 기반 멘트
    pub remark: String,
    /// 현재 분위기
    pub mood: Mood,
    /// 이번 입력에서 새로 배운 단어
    pub learned: Vec<String>,
    /// 피드백으로 섭동된 블록 수
    pub perturbed: usize,
}

pub struct Session {
    pipeline: Pipeline,
    codec: TextCodec,
    vocabulary: Vocabulary,
    profile: UserProfile,
    emotions: EmotionTracker,
    paths: SessionPaths,
    depth: Option<usize>,
}

impl Session {
    /// 세션 열기 (저장된 모델 상태, 어휘, 프로필이 있으면 로드)
    ///
    /// 설정의 보관 전략이 `Discard`이면 `paths.blocks` 디스크 보관소를 쓴다.
    pub fn open(mut config: PipelineConfig, paths: SessionPaths) -> Result<Self> {
        if config.spill == SpillStrategy::Discard {
            config.spill = SpillStrategy::Disk {
                dir: paths.blocks.clone(),
            };
        }
        let codec = TextCodec::new(config.unit_size);
        let mut pipeline = Pipeline::new(config).context("파이프라인 생성 실패")?;
        if paths.state.exists() {
            pipeline
                .load(&paths.state)
                .with_context(|| format!("모델 상태를 불러올 수 없습니다: {}", paths.state.display()))?;
        }
        let vocabulary = Vocabulary::load(paths.vocabulary.clone())?;
        let profile = UserProfile::load(paths.profile.clone())?;

        info!(
            "session opened: window {:?}, {} known words",
            pipeline.store().window(),
            vocabulary.len()
        );

        Ok(Self {
            pipeline,
            codec,
            vocabulary,
            profile,
            emotions: EmotionTracker::new(),
            paths,
            depth: None,
        })
    }

    /// 패스 깊이 지정 (기본은 설정의 `pass_depth`)
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn emotions(&self) -> &EmotionTracker {
        &self.emotions
    }

    /// 입력 한 줄 처리
    pub fn respond(&mut self, text: &str, feedback: f64) -> Result<Reply> {
        let learned = self.vocabulary.learn(text);
        if !learned.is_empty() {
            self.vocabulary.save()?;
        }
        self.profile.record(text);
        self.emotions.update(text);

        let (transformed, output, perturbed) = match self.codec.encode(text) {
            Ok(input) => {
                let output = match self.depth {
                    Some(depth) => self.pipeline.forward_to_depth(&input, depth)?,
                    None => self.pipeline.forward(&input)?,
                };
                let perturbed = self.pipeline.apply_feedback(feedback)?;
                let transformed = self.codec.decode(&output, text.chars().count());
                (transformed, output, perturbed)
            }
            Err(PipelineError::EmptyInput) => (String::new(), Vec::new(), 0),
            Err(e) => return Err(e.into()),
        };

        Ok(Reply {
            transformed,
            output,
            remark: remark_for(text),
            mood: self.emotions.current(),
            learned,
            perturbed,
        })
    }

    /// 모델 상태, 어휘, 프로필 저장
    ///
    /// 하나가 실패해도 나머지는 저장을 시도하고, 첫 번째 에러를 돌려준다.
    pub fn close(self) -> Result<()> {
        let state = &self.paths.state;
        let results = [
            self.pipeline
                .save(state)
                .with_context(|| format!("모델 상태를 저장할 수 없습니다: {}", state.display())),
            self.vocabulary.save(),
            self.profile.save(),
        ];

        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                error!("{:#}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                info!("session closed");
                Ok(())
            }
        }
    }
}
