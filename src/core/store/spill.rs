//! 축출 블록 보관소
//!
//! 윈도우 밖으로 밀려난 블록을 직렬화해 두었다가 다시 들어올 때 복원한다.

use crate::core::config::SpillStrategy;
use crate::core::error::{PipelineError, Result};
use crate::core::layers::Block;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 보관소 통계
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SpillStats {
    pub writes: u64,
    pub reads: u64,
    pub misses: u64,
}

/// 보관소 구현 트레이트
///
/// 프리페치 스레드에서도 호출되므로 `Send + Sync`여야 한다.
pub trait BlockSpill: Send + Sync {
    /// 블록 저장 (같은 인덱스는 덮어씀)
    fn store(&self, block: &Block) -> Result<()>;

    /// 블록 복원. 저장된 적 없으면 `None`
    fn fetch(&self, index: usize) -> Result<Option<Block>>;

    /// 통계 가져오기
    fn stats(&self) -> SpillStats;

    /// 실제로 데이터를 보존하는지
    fn is_durable(&self) -> bool {
        true
    }
}

pub(crate) fn encode_block(block: &Block) -> Result<Vec<u8>> {
    bincode::serialize(block).map_err(|e| {
        PipelineError::storage(
            format!("encoding block {}", block.index()),
            io::Error::new(io::ErrorKind::Other, e),
        )
    })
}

pub(crate) fn decode_block(index: usize, bytes: &[u8]) -> Result<Block> {
    bincode::deserialize(bytes)
        .map_err(|e| PipelineError::CorruptState(format!("spilled block {} unreadable: {}", index, e)))
}

/// 보관하지 않음 - 밀려난 블록은 버려지고 다음에 시드로 새로 만들어짐
pub struct DiscardSpill;

impl BlockSpill for DiscardSpill {
    fn store(&self, _block: &Block) -> Result<()> {
        Ok(())
    }

    fn fetch(&self, _index: usize) -> Result<Option<Block>> {
        Ok(None)
    }

    fn stats(&self) -> SpillStats {
        SpillStats::default()
    }

    fn is_durable(&self) -> bool {
        false
    }
}

/// 메모리 보관소 - 직렬화된 바이트를 맵에 보관
pub struct MemorySpill {
    blocks: RwLock<HashMap<usize, Vec<u8>>>,
    stats: RwLock<SpillStats>,
}

impl MemorySpill {
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
            stats: RwLock::new(SpillStats::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

impl Default for MemorySpill {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockSpill for MemorySpill {
    fn store(&self, block: &Block) -> Result<()> {
        let bytes = encode_block(block)?;
        self.blocks.write().insert(block.index(), bytes);
        self.stats.write().writes += 1;
        Ok(())
    }

    fn fetch(&self, index: usize) -> Result<Option<Block>> {
        let blocks = self.blocks.read();
        let mut stats = self.stats.write();
        match blocks.get(&index) {
            Some(bytes) => {
                stats.reads += 1;
                decode_block(index, bytes).map(Some)
            }
            None => {
                stats.misses += 1;
                Ok(None)
            }
        }
    }

    fn stats(&self) -> SpillStats {
        self.stats.read().clone()
    }
}

/// 디스크 보관소 - 블록마다 bincode 파일 하나
///
/// 임시 파일에 쓴 뒤 rename 하므로 읽는 쪽은 완전한 파일만 본다.
pub struct DiskSpill {
    dir: PathBuf,
    stats: RwLock<SpillStats>,
}

impl DiskSpill {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| PipelineError::storage(format!("creating spill dir {}", dir.display()), e))?;
        Ok(Self {
            dir,
            stats: RwLock::new(SpillStats::default()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn block_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("block_{:012}.bin", index))
    }
}

impl BlockSpill for DiskSpill {
    fn store(&self, block: &Block) -> Result<()> {
        let path = self.block_path(block.index());
        let tmp = path.with_extension("bin.tmp");
        let context = || format!("flushing block {} to {}", block.index(), path.display());

        let file = File::create(&tmp).map_err(|e| PipelineError::storage(context(), e))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, block).map_err(|e| {
            PipelineError::storage(context(), io::Error::new(io::ErrorKind::Other, e))
        })?;
        writer.flush().map_err(|e| PipelineError::storage(context(), e))?;
        drop(writer);
        fs::rename(&tmp, &path).map_err(|e| PipelineError::storage(context(), e))?;

        self.stats.write().writes += 1;
        Ok(())
    }

    fn fetch(&self, index: usize) -> Result<Option<Block>> {
        let path = self.block_path(index);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.stats.write().misses += 1;
                return Ok(None);
            }
            Err(e) => {
                return Err(PipelineError::storage(
                    format!("reading block {} from {}", index, path.display()),
                    e,
                ))
            }
        };
        let block: Block = bincode::deserialize_from(BufReader::new(file)).map_err(|e| {
            PipelineError::CorruptState(format!("spilled block {} unreadable: {}", index, e))
        })?;
        self.stats.write().reads += 1;
        Ok(Some(block))
    }

    fn stats(&self) -> SpillStats {
        self.stats.read().clone()
    }
}

/// 보관 전략에 따른 보관소 생성
pub fn create_spill(strategy: &SpillStrategy) -> Result<Arc<dyn BlockSpill>> {
    Ok(match strategy {
        SpillStrategy::Discard => Arc::new(DiscardSpill),
        SpillStrategy::Memory => Arc::new(MemorySpill::new()),
        SpillStrategy::Disk { dir } => Arc::new(DiskSpill::new(dir.clone())?),
    })
}
