//! Integration tests for the LRU-K replacer

use pagepool::buffer::LruKReplacer;
use pagepool::common::FrameId;

#[test]
fn test_lru_k_classic_sequence() {
    // Seven frames, K = 2, the access pattern 1,2,3,4,5,6,1,2,3,4,5.
    let replacer = LruKReplacer::new(7, 2);

    for id in [1, 2, 3, 4, 5, 6, 1, 2, 3, 4, 5] {
        replacer.record_access(FrameId::new(id));
    }
    for id in 1..=6 {
        replacer.set_evictable(FrameId::new(id), true);
    }
    assert_eq!(replacer.size(), 6);

    // Frame 6 is the only one with fewer than two accesses, so it goes
    // first; the rest follow in order of their oldest second-to-last
    // access.
    assert_eq!(replacer.evict(), Some(FrameId::new(6)));
    assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    assert_eq!(replacer.evict(), Some(FrameId::new(2)));
    assert_eq!(replacer.evict(), Some(FrameId::new(3)));
    assert_eq!(replacer.evict(), Some(FrameId::new(4)));
    assert_eq!(replacer.evict(), Some(FrameId::new(5)));
    assert_eq!(replacer.evict(), None);
    assert_eq!(replacer.size(), 0);
}

#[test]
fn test_lru_k_under_k_frames_go_first() {
    let replacer = LruKReplacer::new(10, 3);

    // Frame 0 gets three accesses, frames 1 and 2 fewer.
    for _ in 0..3 {
        replacer.record_access(FrameId::new(0));
    }
    replacer.record_access(FrameId::new(1));
    replacer.record_access(FrameId::new(2));
    replacer.record_access(FrameId::new(2));

    for id in 0..3 {
        replacer.set_evictable(FrameId::new(id), true);
    }

    // Both under-K frames precede the fully-accessed one, ordered by
    // first sight.
    assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    assert_eq!(replacer.evict(), Some(FrameId::new(2)));
    assert_eq!(replacer.evict(), Some(FrameId::new(0)));
}

#[test]
fn test_lru_k_eviction_follows_kth_access_order() {
    let replacer = LruKReplacer::new(10, 2);

    // Interleave so most-recent order differs from K-th-recent order:
    // frame 0 at t0,t3; frame 1 at t1,t2.
    replacer.record_access(FrameId::new(0));
    replacer.record_access(FrameId::new(1));
    replacer.record_access(FrameId::new(1));
    replacer.record_access(FrameId::new(0));

    replacer.set_evictable(FrameId::new(0), true);
    replacer.set_evictable(FrameId::new(1), true);

    // Frame 0's second-to-last access (t0) is older than frame 1's (t1),
    // even though frame 0 was touched most recently.
    assert_eq!(replacer.evict(), Some(FrameId::new(0)));
    assert_eq!(replacer.evict(), Some(FrameId::new(1)));
}

#[test]
fn test_lru_k_pinned_frames_skipped() {
    let replacer = LruKReplacer::new(10, 2);

    for id in 0..3 {
        replacer.record_access(FrameId::new(id));
    }
    replacer.set_evictable(FrameId::new(1), true);
    replacer.set_evictable(FrameId::new(2), true);

    assert_eq!(replacer.size(), 2);
    assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    assert_eq!(replacer.evict(), Some(FrameId::new(2)));
    // Frame 0 was never evictable.
    assert_eq!(replacer.evict(), None);
}

#[test]
fn test_lru_k_evicted_frame_restarts_history() {
    let replacer = LruKReplacer::new(10, 2);

    replacer.record_access(FrameId::new(0));
    replacer.record_access(FrameId::new(0));
    replacer.record_access(FrameId::new(1));
    replacer.set_evictable(FrameId::new(0), true);
    replacer.set_evictable(FrameId::new(1), true);

    assert_eq!(replacer.evict(), Some(FrameId::new(1)));

    // Re-seen after eviction: the old history is gone, so frame 1 is an
    // under-K newcomer again and precedes frame 0.
    replacer.record_access(FrameId::new(1));
    replacer.set_evictable(FrameId::new(1), true);
    assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    assert_eq!(replacer.evict(), Some(FrameId::new(0)));
}

#[test]
fn test_lru_k_set_evictable_toggles_size() {
    let replacer = LruKReplacer::new(10, 2);

    replacer.record_access(FrameId::new(0));
    replacer.record_access(FrameId::new(1));
    replacer.set_evictable(FrameId::new(0), true);
    replacer.set_evictable(FrameId::new(1), true);
    assert_eq!(replacer.size(), 2);

    replacer.set_evictable(FrameId::new(0), false);
    assert_eq!(replacer.size(), 1);

    replacer.set_evictable(FrameId::new(0), true);
    assert_eq!(replacer.size(), 2);
}

#[test]
fn test_lru_k_concurrent_record_and_evict() {
    use std::sync::Arc;
    use std::thread;

    let replacer = Arc::new(LruKReplacer::new(64, 2));

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let replacer = Arc::clone(&replacer);
            thread::spawn(move || {
                for i in 0..16 {
                    let frame_id = FrameId::new(t * 16 + i);
                    replacer.record_access(frame_id);
                    replacer.record_access(frame_id);
                    replacer.set_evictable(frame_id, true);
                }
            })
        })
        .collect();

    for handle in writers {
        handle.join().unwrap();
    }

    assert_eq!(replacer.size(), 64);
    let mut seen = std::collections::HashSet::new();
    while let Some(frame_id) = replacer.evict() {
        assert!(seen.insert(frame_id), "frame evicted twice");
    }
    assert_eq!(seen.len(), 64);
}
