//! # 파이프라인 구성 설정
//!
//! 유닛 크기, 블록당 유닛 수, 선언 깊이, 윈도우/프리페치 용량과 난수 시드

use crate::core::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// 윈도우에서 밀려난 블록을 어디에 보관할지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpillStrategy {
    /// 보관하지 않음 - 밀려난 블록은 버려짐
    Discard,
    /// 프로세스 메모리에 직렬화해서 보관
    Memory,
    /// 디렉토리에 블록별 파일로 보관
    Disk { dir: PathBuf },
}

impl Default for SpillStrategy {
    fn default() -> Self {
        SpillStrategy::Discard
    }
}

/// 파이프라인 전체 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 유닛 크기 N (가중치 N×N, 편향 N)
    pub unit_size: usize,
    /// 블록(슈퍼 레이어)당 유닛 수
    pub units_per_block: usize,
    /// 선언된 논리 깊이 (권고값, 실제로 전부 만들지 않음)
    pub declared_total: usize,
    /// 윈도우 용량 W
    pub window_capacity: usize,
    /// 프리페치 깊이 P (P < W)
    pub prefetch_depth: usize,
    /// 한 번의 forward 패스가 지나가는 블록 수
    pub pass_depth: usize,
    /// 가중치 초기화 분산 계수
    pub init_scale: f64,
    /// 난수 시드
    pub seed: u64,
    /// 밀려난 블록 보관 방식
    pub spill: SpillStrategy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            unit_size: 200,
            units_per_block: 200,
            declared_total: 84_572_910,
            window_capacity: 4,
            prefetch_depth: 2,
            pass_depth: 100,
            init_scale: 1.0,
            seed: 42,
            spill: SpillStrategy::Discard,
        }
    }
}

impl PipelineConfig {
    /// 작은 크기의 설정 (테스트 및 데모용)
    pub fn small(unit_size: usize, units_per_block: usize, window_capacity: usize) -> Self {
        Self {
            unit_size,
            units_per_block,
            declared_total: 1000,
            window_capacity,
            prefetch_depth: window_capacity.saturating_sub(1).min(2),
            pass_depth: window_capacity,
            ..Self::default()
        }
    }

    /// JSON 파일에서 설정 로드
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| PipelineError::storage(format!("opening config {}", path.display()), e))?;
        let config: PipelineConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| PipelineError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<()> {
        if self.window_capacity < 1 {
            return Err(PipelineError::CapacityExceeded {
                capacity: self.window_capacity,
            });
        }
        if self.unit_size == 0 {
            return Err(PipelineError::InvalidConfig("unit_size must be at least 1".into()));
        }
        if self.units_per_block == 0 {
            return Err(PipelineError::InvalidConfig(
                "units_per_block must be at least 1".into(),
            ));
        }
        if self.pass_depth == 0 {
            return Err(PipelineError::InvalidConfig("pass_depth must be at least 1".into()));
        }
        if self.prefetch_depth >= self.window_capacity {
            return Err(PipelineError::InvalidConfig(format!(
                "prefetch_depth ({}) must be smaller than window_capacity ({})",
                self.prefetch_depth, self.window_capacity
            )));
        }
        if !self.init_scale.is_finite() {
            return Err(PipelineError::InvalidConfig("init_scale must be finite".into()));
        }
        Ok(())
    }

    /// 블록 형상
    pub fn block_shape(&self) -> BlockShape {
        BlockShape {
            unit_size: self.unit_size,
            units_per_block: self.units_per_block,
            init_scale: self.init_scale,
        }
    }
}

/// 블록 구체화에 필요한 형상 정보
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockShape {
    pub unit_size: usize,
    pub units_per_block: usize,
    pub init_scale: f64,
}
