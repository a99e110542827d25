#![allow(missing_docs)]

use centinela::{GuardedHeap, IndexedTable};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn drain<V>(heap: &mut GuardedHeap, table: &IndexedTable<V>) -> Vec<String> {
    let mut iter = table.iter(heap);
    let mut keys = Vec::new();
    while let Some((key, _)) = iter.next(heap) {
        keys.push(key);
    }
    keys
}

#[test]
fn directory_scenario_end_to_end() {
    init_tracing();
    let mut heap = GuardedHeap::new();
    let mut table = IndexedTable::create(&mut heap);

    table.insert(&mut heap, "mallory", "basement");
    table.insert(&mut heap, "alice", "attic");
    table.insert(&mut heap, "bob", "garage");
    table.dump(&heap);

    assert_eq!(table.len(&heap), 3);
    assert_eq!(table.read(&heap, "alice"), Some(&"attic"));
    assert_eq!(table.read(&heap, "mallory"), Some(&"basement"));
    assert_eq!(table.read(&heap, "zoe"), None);
    assert_eq!(drain(&mut heap, &table), ["alice", "bob", "mallory"]);

    table.destroy(&mut heap);
    let report = heap.report();
    assert!(report.chunks.iter().all(|row| row.free), "{report}");
}

#[test]
fn twenty_five_keys_cross_two_capacity_doublings() {
    init_tracing();
    let mut heap = GuardedHeap::new();
    let mut table = IndexedTable::create(&mut heap);

    let mut expected = Vec::new();
    for i in 0..25u32 {
        let key = format!(
            "{}{}{}",
            char::from(b'a' + (i % 5) as u8),
            char::from(b'v' + (i / 5) as u8),
            char::from(b'q'),
        );
        table.insert(&mut heap, &key, i);
        expected.push(key);
    }
    assert_eq!(table.len(&heap), 25);

    expected.sort();
    expected.dedup();
    assert_eq!(expected.len(), 25, "keys must be distinct");
    assert_eq!(drain(&mut heap, &table), expected);

    for key in &expected {
        assert!(table.read(&heap, key).is_some());
    }
}

#[test]
fn tables_sharing_a_heap_stay_independent() {
    let mut heap = GuardedHeap::new();
    let mut left = IndexedTable::create(&mut heap);
    let mut right = IndexedTable::create(&mut heap);

    left.insert(&mut heap, "shared-key", 1u32);
    right.insert(&mut heap, "shared-key", 2u32);

    left.destroy(&mut heap);
    assert_eq!(right.read(&heap, "shared-key"), Some(&2));
    assert_eq!(drain(&mut heap, &right), ["shared-key"]);
}

#[test]
fn destroyed_table_storage_is_recycled() {
    let mut heap = GuardedHeap::new();
    let mut table = IndexedTable::create(&mut heap);
    for key in ["a", "b", "c"] {
        table.insert(&mut heap, key, 0u32);
    }
    table.destroy(&mut heap);

    let backed = heap.chunk_count();
    let mut replacement = IndexedTable::create(&mut heap);
    replacement.insert(&mut heap, "a", 0u32);
    assert_eq!(
        heap.chunk_count(),
        backed,
        "the replacement table must live in recycled chunks"
    );
    replacement.destroy(&mut heap);
}

#[test]
fn iterator_state_is_heap_backed_and_released() {
    let mut heap = GuardedHeap::new();
    let mut table = IndexedTable::create(&mut heap);
    table.insert(&mut heap, "x", 0u32);
    table.insert(&mut heap, "y", 1u32);

    let backed = heap.chunk_count();
    let free_before = heap.free_count();

    let mut iter = table.iter(&mut heap);
    assert_eq!(heap.chunk_count(), backed + 1, "position lives in a chunk");

    assert_eq!(iter.next(&mut heap).map(|(k, _)| k).as_deref(), Some("x"));
    assert_eq!(iter.next(&mut heap).map(|(k, _)| k).as_deref(), Some("y"));
    assert!(iter.next(&mut heap).is_none());
    assert_eq!(heap.free_count(), free_before + 1);
}
