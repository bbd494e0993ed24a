//! 파이프라인 스냅샷 파일
//!
//! 현재 윈도우의 블록들과 논리 깊이 카운터만 저장한다. 윈도우 밖 블록은 절대 담지 않는다.

use crate::core::error::{PipelineError, Result};
use crate::core::layers::Block;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::ops::Range;
use std::path::Path;

/// 파일 식별자
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"NBAS";
/// 포맷 버전
pub const SNAPSHOT_VERSION: u32 = 1;

/// 스냅샷 레코드
///
/// 저장할 때는 `Snapshot<&Block>`, 읽을 때는 `Snapshot<Block>`을 쓴다. 두 형태의 바이트 표현은 같다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<B> {
    pub magic: [u8; 4],
    pub version: u32,
    pub declared_total: usize,
    pub units_per_block: usize,
    pub unit_size: usize,
    pub seed: u64,
    pub cursor: usize,
    pub feedback_rounds: u64,
    pub window_start: usize,
    pub blocks: Vec<B>,
}

/// 읽어 들인 스냅샷
pub type PipelineSnapshot = Snapshot<Block>;

impl<B> Snapshot<B> {
    /// 저장된 윈도우 범위
    pub fn window(&self) -> Range<usize> {
        self.window_start..self.window_start + self.blocks.len()
    }
}

impl<B: Serialize> Snapshot<B> {
    /// 임시 파일에 쓴 뒤 rename
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("tmp");
        let context = || format!("saving snapshot to {}", path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PipelineError::storage(context(), e))?;
        }
        let file = File::create(&tmp).map_err(|e| PipelineError::storage(context(), e))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)
            .map_err(|e| PipelineError::storage(context(), io::Error::new(io::ErrorKind::Other, e)))?;
        writer.flush().map_err(|e| PipelineError::storage(context(), e))?;
        drop(writer);
        fs::rename(&tmp, path).map_err(|e| PipelineError::storage(context(), e))
    }
}

impl PipelineSnapshot {
    /// 파일에서 스냅샷 읽기 (헤더 검증 포함)
    pub fn read_from(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| PipelineError::storage(format!("opening snapshot {}", path.display()), e))?;
        let snapshot: PipelineSnapshot = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| PipelineError::CorruptState(format!("snapshot {} unreadable: {}", path.display(), e)))?;

        if snapshot.magic != SNAPSHOT_MAGIC {
            return Err(PipelineError::CorruptState(format!(
                "{} is not a pipeline snapshot",
                path.display()
            )));
        }
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PipelineError::CorruptState(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        Ok(snapshot)
    }
}
