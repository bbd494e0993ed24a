//! 저장 → 새 프로세스 로드 → 같은 입력 재실행 시나리오

use nbas_pipeline::core::store::{DiskSpill, MemorySpill};
use nbas_pipeline::{Pipeline, PipelineConfig, PipelineError, SpillStrategy, TextCodec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn scenario_config() -> PipelineConfig {
    PipelineConfig {
        unit_size: 4,
        units_per_block: 2,
        window_capacity: 3,
        declared_total: 1000,
        prefetch_depth: 2,
        pass_depth: 5,
        ..PipelineConfig::default()
    }
}

fn random_input(seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..4).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

#[test]
fn test_saved_window_reproduces_output_in_fresh_pipeline() {
    let temp_dir = tempfile::tempdir().expect("임시 디렉토리 생성 실패");
    let state = temp_dir.path().join("model_state.bin");
    let input = random_input(7);

    let mut first = Pipeline::new(scenario_config()).unwrap();
    let expected = first.forward(&input).unwrap();
    assert_eq!(first.store().window(), 2..5);
    first.save(&state).unwrap();

    let mut second = Pipeline::new(scenario_config()).unwrap();
    second.load(&state).unwrap();
    assert_eq!(second.store().window(), 2..5);

    let actual = second.forward(&input).unwrap();
    assert_eq!(actual, expected);
}

#[test]
fn test_window_never_exceeds_capacity_over_long_pass() {
    let config = PipelineConfig {
        pass_depth: 40,
        ..scenario_config()
    };
    let mut pipeline = Pipeline::new(config).unwrap();
    pipeline.forward(&random_input(1)).unwrap();

    let store = pipeline.store();
    assert_eq!(store.window(), 37..40);
    assert!(store.len() <= store.capacity());
    assert_eq!(store.stats().evictions, 37);
}

#[test]
fn test_feedback_survives_memory_spill_round_trip() {
    let input = random_input(11);
    let spill = Arc::new(MemorySpill::new());
    let mut pipeline = Pipeline::with_spill(scenario_config(), spill.clone()).unwrap();

    let before = pipeline.forward(&input).unwrap();
    // 0, 1은 보관소에서, 2..5는 윈도우에서 섭동
    assert_eq!(pipeline.apply_feedback(0.5).unwrap(), 5);

    let perturbed: Vec<_> = pipeline.store().resident_blocks().cloned().collect();
    let after = pipeline.forward(&input).unwrap();
    assert_ne!(after, before);

    let reloaded: Vec<_> = (2..5)
        .map(|i| pipeline.store().get(i).cloned().unwrap())
        .collect();
    assert_eq!(reloaded, perturbed);
    assert!(spill.len() >= 5);
}

#[test]
fn test_disk_spill_shared_between_pipelines() {
    let temp_dir = tempfile::tempdir().expect("임시 디렉토리 생성 실패");
    let spill_dir = temp_dir.path().join("blocks");
    let state = temp_dir.path().join("model_state.bin");
    let input = random_input(3);

    let config = PipelineConfig {
        spill: SpillStrategy::Disk { dir: spill_dir.clone() },
        ..scenario_config()
    };

    let mut first = Pipeline::new(config.clone()).unwrap();
    first.forward(&input).unwrap();
    first.apply_feedback(-0.25).unwrap();
    let expected = first.forward(&input).unwrap();
    first.save(&state).unwrap();
    drop(first);

    let spill = Arc::new(DiskSpill::new(&spill_dir).unwrap());
    let mut second = Pipeline::with_spill(config, spill).unwrap();
    second.load(&state).unwrap();
    assert_eq!(second.forward(&input).unwrap(), expected);
}

#[test]
fn test_mismatched_snapshot_is_rejected() {
    let temp_dir = tempfile::tempdir().expect("임시 디렉토리 생성 실패");
    let state = temp_dir.path().join("model_state.bin");

    let mut pipeline = Pipeline::new(scenario_config()).unwrap();
    pipeline.forward(&random_input(5)).unwrap();
    pipeline.save(&state).unwrap();

    let other = PipelineConfig {
        units_per_block: 3,
        ..scenario_config()
    };
    let mut other = Pipeline::new(other).unwrap();
    match other.load(&state) {
        Err(PipelineError::CorruptState(_)) => {}
        result => panic!("CorruptState 기대, 실제: {:?}", result),
    }
    assert!(other.store().is_empty());
}

#[test]
fn test_text_round_trip_through_codec() {
    let codec = TextCodec::new(4);
    let mut pipeline = Pipeline::new(scenario_config()).unwrap();

    let input = codec.encode("hi").unwrap();
    assert_eq!(input, vec![104.0, 105.0, 0.0, 0.0]);

    let output = pipeline.forward(&input).unwrap();
    assert_eq!(codec.decode(&output, 2).chars().count(), 2);
    assert!(matches!(codec.encode(""), Err(PipelineError::EmptyInput)));
}
