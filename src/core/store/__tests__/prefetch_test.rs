use crate::core::config::PipelineConfig;
use crate::core::layers::Block;
use crate::core::store::*;
use std::sync::Arc;

fn config(window: usize, prefetch: usize) -> PipelineConfig {
    PipelineConfig {
        prefetch_depth: prefetch,
        ..PipelineConfig::small(4, 2, window)
    }
}

fn run_pass(store: &mut LayerStore, depth: usize) -> Vec<Block> {
    store.begin_pass(depth);
    (0..depth)
        .map(|_| store.next_in_order().unwrap().clone())
        .collect()
}

#[test]
fn test_prefetched_blocks_match_synchronous_ones() {
    let mut sync_store = LayerStore::new(&config(3, 0)).unwrap();
    let mut prefetch_store = LayerStore::new(&config(3, 2)).unwrap();

    let sync_blocks = run_pass(&mut sync_store, 6);
    let prefetched_blocks = run_pass(&mut prefetch_store, 6);

    assert_eq!(sync_blocks, prefetched_blocks);
    assert_eq!(sync_store.stats().prefetch_hits, 0);
    assert_eq!(sync_store.stats().sync_loads, 6);
}

#[test]
fn test_prefetch_serves_every_block_after_the_first() {
    let mut store = LayerStore::new(&config(3, 2)).unwrap();
    run_pass(&mut store, 5);

    let stats = store.stats();
    assert_eq!(stats.sync_loads, 1, "커서 0만 동기 로드");
    assert_eq!(stats.prefetch_hits, 4);
    assert_eq!(stats.fresh, 5);
}

#[test]
fn test_prefetch_stays_within_depth_and_pass_limit() {
    let mut store = LayerStore::new(&config(4, 2)).unwrap();
    store.begin_pass(4);

    store.next_in_order().unwrap();
    assert_eq!(store.in_flight(), vec![1, 2]);

    store.next_in_order().unwrap();
    assert_eq!(store.in_flight(), vec![2, 3]);

    store.next_in_order().unwrap();
    // 패스 상한 4 이상은 프리페치하지 않음
    assert_eq!(store.in_flight(), vec![3]);

    store.next_in_order().unwrap();
    assert!(store.in_flight().is_empty());
}

#[test]
fn test_new_pass_drops_in_flight_work() {
    let mut store = LayerStore::new(&config(3, 2)).unwrap();
    store.begin_pass(10);
    store.next_in_order().unwrap();
    assert!(!store.in_flight().is_empty());

    store.begin_pass(10);
    assert!(store.in_flight().is_empty());
    assert_eq!(store.next_in_order().unwrap().index(), 0);
}

#[test]
fn test_prefetch_restores_spilled_blocks() {
    let spill = Arc::new(MemorySpill::new());
    let mut store = LayerStore::with_spill(&config(2, 1), spill.clone()).unwrap();

    store.begin_pass(4);
    for _ in 0..4 {
        store.next_in_order().unwrap();
    }
    // 블록 0, 1은 보관소에 있음
    assert_eq!(spill.len(), 2);

    // 보관소 내용을 바꿔서 실제로 보관소에서 읽는지 확인
    let mut marked = spill.fetch(1).unwrap().unwrap();
    marked.perturb_all(3.0, 1);
    spill.store(&marked).unwrap();

    let blocks = run_pass(&mut store, 2);
    assert_eq!(blocks[1], marked);
    assert!(store.stats().restored >= 2);
}

#[test]
fn test_materialize_prefers_spill_over_fresh() {
    let spill = MemorySpill::new();
    let shape = config(2, 0).block_shape();

    let (fresh, origin) = materialize(3, shape, 42, &spill).unwrap();
    assert_eq!(origin, Origin::Fresh);
    assert_eq!(fresh, Block::fresh(3, shape, 42));

    let mut changed = fresh.clone();
    changed.perturb_all(1.0, 8);
    spill.store(&changed).unwrap();

    let (restored, origin) = materialize(3, shape, 42, &spill).unwrap();
    assert_eq!(origin, Origin::Restored);
    assert_eq!(restored, changed);
}
