use crate::core::config::{BlockShape, PipelineConfig};
use crate::core::error::PipelineError;
use crate::core::layers::Block;
use crate::core::pipeline::*;
use std::fs;
use tempfile::TempDir;

fn 테스트_디렉토리_생성() -> TempDir {
    tempfile::tempdir().expect("임시 디렉토리 생성 실패")
}

fn config() -> PipelineConfig {
    PipelineConfig {
        prefetch_depth: 1,
        ..PipelineConfig::small(4, 2, 3)
    }
}

fn input() -> Vec<f64> {
    vec![1.0, 0.0, -1.0, 0.5]
}

fn resident(pipeline: &Pipeline) -> Vec<Block> {
    pipeline.store().resident_blocks().cloned().collect()
}

#[test]
fn test_save_then_load_is_bit_identical() {
    let temp_dir = 테스트_디렉토리_생성();
    let path = temp_dir.path().join("model_state.bin");

    let mut original = Pipeline::new(config()).unwrap();
    original.forward_to_depth(&input(), 5).unwrap();
    original.apply_feedback(0.75).unwrap();
    original.save(&path).unwrap();

    let mut restored = Pipeline::new(config()).unwrap();
    restored.load(&path).unwrap();

    assert_eq!(restored.store().window(), 2..5);
    assert_eq!(resident(&restored), resident(&original));
    assert_eq!(restored.feedback_rounds(), 1);
    assert_eq!(restored.store().cursor(), 5);
}

#[test]
fn test_snapshot_holds_exactly_the_window() {
    let temp_dir = 테스트_디렉토리_생성();
    let path = temp_dir.path().join("state.bin");

    let mut pipeline = Pipeline::new(config()).unwrap();
    pipeline.forward_to_depth(&input(), 5).unwrap();
    pipeline.save(&path).unwrap();

    let snapshot = PipelineSnapshot::read_from(&path).unwrap();
    assert_eq!(snapshot.window(), 2..5);
    let indices: Vec<usize> = snapshot.blocks.iter().map(Block::index).collect();
    assert_eq!(indices, vec![2, 3, 4]);
    assert_eq!(snapshot.declared_total, 1000);
    assert_eq!(snapshot.unit_size, 4);
    assert_eq!(snapshot.units_per_block, 2);
}

#[test]
fn test_load_adopts_stored_declared_total() {
    let temp_dir = 테스트_디렉토리_생성();
    let path = temp_dir.path().join("state.bin");

    let mut pipeline = Pipeline::new(PipelineConfig {
        declared_total: 84_572_910,
        ..config()
    })
    .unwrap();
    pipeline.forward_to_depth(&input(), 2).unwrap();
    pipeline.save(&path).unwrap();

    let mut other = Pipeline::new(config()).unwrap();
    other.load(&path).unwrap();
    assert_eq!(other.declared_total(), 84_572_910);
}

#[test]
fn test_load_rejects_foreign_unit_size_without_side_effects() {
    let temp_dir = 테스트_디렉토리_생성();
    let path = temp_dir.path().join("state.bin");

    let mut wide = Pipeline::new(PipelineConfig {
        prefetch_depth: 1,
        ..PipelineConfig::small(5, 2, 3)
    })
    .unwrap();
    wide.forward_to_depth(&[0.1; 5], 2).unwrap();
    wide.save(&path).unwrap();

    let mut pipeline = Pipeline::new(config()).unwrap();
    pipeline.forward_to_depth(&input(), 2).unwrap();
    let before = resident(&pipeline);

    assert!(matches!(pipeline.load(&path), Err(PipelineError::CorruptState(_))));
    assert_eq!(resident(&pipeline), before);
    assert_eq!(pipeline.store().window(), 0..2);
}

#[test]
fn test_load_rejects_foreign_units_per_block() {
    let temp_dir = 테스트_디렉토리_생성();
    let path = temp_dir.path().join("state.bin");

    let mut deep = Pipeline::new(PipelineConfig {
        prefetch_depth: 1,
        ..PipelineConfig::small(4, 3, 3)
    })
    .unwrap();
    deep.forward_to_depth(&input(), 1).unwrap();
    deep.save(&path).unwrap();

    let mut pipeline = Pipeline::new(config()).unwrap();
    assert!(matches!(pipeline.load(&path), Err(PipelineError::CorruptState(_))));
}

#[test]
fn test_load_rejects_blocks_with_wrong_dimensions() {
    let temp_dir = 테스트_디렉토리_생성();
    let path = temp_dir.path().join("tampered.bin");

    // 헤더는 맞지만 블록 내부 유닛 크기가 다름
    let foreign = BlockShape {
        unit_size: 6,
        units_per_block: 2,
        init_scale: 1.0,
    };
    let block = Block::fresh(0, foreign, 1);
    let snapshot = Snapshot {
        magic: SNAPSHOT_MAGIC,
        version: SNAPSHOT_VERSION,
        declared_total: 1000,
        units_per_block: 2,
        unit_size: 4,
        seed: 42,
        cursor: 1,
        feedback_rounds: 0,
        window_start: 0,
        blocks: vec![&block],
    };
    snapshot.write_to(&path).unwrap();

    let mut pipeline = Pipeline::new(config()).unwrap();
    assert!(matches!(pipeline.load(&path), Err(PipelineError::CorruptState(_))));
    assert!(pipeline.store().is_empty());
}

#[test]
fn test_load_rejects_wrong_magic_and_garbage() {
    let temp_dir = 테스트_디렉토리_생성();

    let wrong_magic = temp_dir.path().join("wrong_magic.bin");
    let snapshot: Snapshot<&Block> = Snapshot {
        magic: *b"XXXX",
        version: SNAPSHOT_VERSION,
        declared_total: 1000,
        units_per_block: 2,
        unit_size: 4,
        seed: 42,
        cursor: 0,
        feedback_rounds: 0,
        window_start: 0,
        blocks: Vec::new(),
    };
    snapshot.write_to(&wrong_magic).unwrap();

    let garbage = temp_dir.path().join("garbage.bin");
    fs::write(&garbage, b"\x01\x02\x03").unwrap();

    let mut pipeline = Pipeline::new(config()).unwrap();
    assert!(matches!(pipeline.load(&wrong_magic), Err(PipelineError::CorruptState(_))));
    assert!(matches!(pipeline.load(&garbage), Err(PipelineError::CorruptState(_))));
}

#[test]
fn test_load_missing_file_is_storage_failure() {
    let temp_dir = 테스트_디렉토리_생성();
    let mut pipeline = Pipeline::new(config()).unwrap();
    let result = pipeline.load(&temp_dir.path().join("missing.bin"));
    assert!(matches!(result, Err(PipelineError::StorageFailure { .. })));
}

#[test]
fn test_save_after_cancel_persists_reached_window() {
    let temp_dir = 테스트_디렉토리_생성();
    let path = temp_dir.path().join("state.bin");

    let mut pipeline = Pipeline::new(config()).unwrap();
    pipeline.forward_to_depth(&input(), 4).unwrap();

    let token = CancelToken::new();
    token.cancel();
    assert!(pipeline.forward_with_cancel(&input(), 4, &token).is_err());
    pipeline.save(&path).unwrap();

    let snapshot = PipelineSnapshot::read_from(&path).unwrap();
    assert_eq!(snapshot.window(), 1..4);
    assert_eq!(snapshot.cursor, 0);
}
