#![allow(missing_docs)]

use centinela::{CallSite, ChunkAllocator, ChunkFault, GuardedHeap, HeapOptions};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[test]
fn ownership_tree_lives_and_dies_together() {
    init_tracing();
    let mut heap = GuardedHeap::new();

    let root = heap.alloc_bytes(None, 32, CallSite::here());
    let branch = heap.alloc_bytes(Some(root), 32, CallSite::here());
    let leaf_a = heap.strdup(Some(branch), "leaf a", CallSite::here());
    let leaf_b = heap.strdup(Some(branch), "leaf b", CallSite::here());
    let loose = heap.alloc_bytes(None, 32, CallSite::here());

    for handle in [root, branch, leaf_a, leaf_b, loose] {
        assert!(heap.is_valid(handle));
    }

    let rebound = heap.unlink(root, CallSite::here());
    assert!(rebound.is_none(), "unlink returns the null rebind");

    for handle in [root, branch, leaf_a, leaf_b] {
        assert_eq!(heap.verify(handle), Err(ChunkFault::Corrupted));
    }
    assert!(heap.is_valid(loose), "unrelated chunk untouched by cascade");
    assert_eq!(heap.free_count(), 4);
}

#[test]
fn corruption_is_detected_then_recertified() {
    init_tracing();
    let mut heap = GuardedHeap::new();

    let handle = heap.alloc_bytes(None, 16, CallSite::here());
    heap.payload_mut(handle)[..4].copy_from_slice(b"good");
    assert_eq!(
        heap.verify(handle),
        Err(ChunkFault::Modified),
        "writes are untrusted until checkpointed"
    );

    heap.checkpoint(handle, CallSite::here());
    assert!(heap.is_valid(handle));

    // Overrun: inside the bucket, past the requested sixteen bytes.
    heap.payload_mut(handle)[16] = 0xff;
    assert_eq!(heap.verify(handle), Err(ChunkFault::Modified));

    heap.checkpoint(handle, CallSite::here());
    assert!(heap.is_valid(handle));
    assert_eq!(&heap.payload(handle)[..4], b"good");
    assert_eq!(heap.payload(handle)[16], 0xff);
}

#[test]
fn resize_chain_carries_content_forward() {
    init_tracing();
    let mut heap = GuardedHeap::new();

    let mut handle = heap.strdup(None, "carried", CallSite::here());
    for grow in [64usize, 200, 1000] {
        let next = heap.allocate(None, Some(handle), 1, grow, CallSite::here());
        assert_ne!(next, handle);
        assert!(!heap.is_valid(handle));
        assert!(heap.is_valid(next));
        assert_eq!(&heap.payload(next)[..7], b"carried");
        handle = next;
    }
    assert_eq!(heap.requested_len(handle), 1000);
}

#[test]
fn handles_from_another_heap_do_not_validate() {
    let mut donor = GuardedHeap::new();
    for _ in 0..3 {
        donor.alloc_bytes(None, 8, CallSite::here());
    }
    let foreign = donor.alloc_bytes(None, 8, CallSite::here());

    let local = GuardedHeap::new();
    assert_eq!(local.verify(foreign), Err(ChunkFault::OutOfRange));
}

#[test]
fn recycling_is_exact_bucket_and_never_shrinks_the_arena() {
    init_tracing();
    let mut heap = GuardedHeap::new();

    let small = heap.alloc_bytes(None, 16, CallSite::here());
    let large = heap.alloc_bytes(None, 700, CallSite::here());
    heap.unlink(small, CallSite::here());
    heap.unlink(large, CallSite::here());
    assert_eq!(heap.chunk_count(), 2);
    assert_eq!(heap.free_count(), 2);

    // 40 bytes rounds to the small bucket, 600 to the large one.
    let reuse_small = heap.alloc_bytes(None, 40, CallSite::here());
    let reuse_large = heap.alloc_bytes(None, 600, CallSite::here());
    assert_eq!(reuse_small, small);
    assert_eq!(reuse_large, large);
    assert_eq!(heap.chunk_count(), 2);
    assert_eq!(heap.free_count(), 0);

    // No exact match for this one; the arena grows instead.
    let fresh = heap.alloc_bytes(None, 5000, CallSite::here());
    assert_eq!(heap.chunk_count(), 3);
    assert!(heap.is_valid(fresh));
}

#[test]
fn scrubbed_heap_zeroes_recycled_payloads() {
    let mut heap = GuardedHeap::with_options(HeapOptions::scrubbed());

    let first = heap.strdup(None, "secret", CallSite::here());
    heap.unlink(first, CallSite::here());

    let second = heap.alloc_bytes(None, 6, CallSite::here());
    assert_eq!(second, first);
    assert!(heap.payload(second).iter().all(|&b| b == 0));
}

#[test]
fn report_tracks_every_chunk_ever_backed() {
    init_tracing();
    let mut heap = GuardedHeap::new();

    let stale = heap.alloc_bytes(None, 8, CallSite::here());
    let dirty = heap.alloc_bytes(None, 8, CallSite::here());
    let clean = heap.strdup(None, "fine", CallSite::here());
    heap.unlink(stale, CallSite::here());
    heap.payload_mut(dirty)[0] = 9;

    let report = heap.report();
    assert_eq!(report.chunks.len(), 3);
    assert_eq!(
        report.chunks.iter().map(|row| row.handle).collect::<Vec<_>>(),
        [clean, dirty, stale],
        "most recently created first"
    );
    assert!(report.chunks[1].modified);
    assert!(report.chunks[2].free);
    assert_eq!(report.suspect_rows().count(), 1);

    let text = report.to_string();
    assert!(text.contains("*** memory report ***"));
    assert!(text.contains(" free "));
    assert!(text.contains(" modified "));
}

#[test]
fn report_serializes_for_machine_consumption() {
    let mut heap = GuardedHeap::new();
    let handle = heap.alloc_bytes(None, 24, CallSite::here());
    heap.unlink(handle, CallSite::here());

    let json = serde_json::to_value(heap.report()).expect("serialize report");
    let row = &json["chunks"][0];
    assert_eq!(row["len"], 24);
    assert_eq!(row["bucket"], 128);
    assert_eq!(row["free"], true);
    assert!(row["allocated"]["file"].as_str().is_some());
    assert!(row["freed"]["line"].as_u64().is_some());
}
