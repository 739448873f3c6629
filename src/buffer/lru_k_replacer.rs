use std::collections::{BTreeMap, HashMap, VecDeque};

use parking_lot::Mutex;

use crate::common::{FrameId, Timestamp};

/// Access history for a single tracked frame.
struct FrameState {
    /// Last up-to-K access timestamps, oldest at the front. A frame seen
    /// for the first time carries a unique below-zero sentinel at the
    /// front until it has K real accesses, so comparing fronts across
    /// frames reproduces the LRU-K order with under-K frames first.
    history: VecDeque<Timestamp>,
    evictable: bool,
}

/// LRU-K replacement policy.
///
/// The victim is the evictable frame with the largest backward K-distance:
/// the time elapsed since its K-th-most-recent access, taken as +inf for
/// frames with fewer than K accesses. Ties among +inf frames go to the
/// frame seen earliest.
///
/// Rather than recomputing distances on eviction, the replacer keeps an
/// ordered map from each evictable frame's front timestamp to its id; the
/// minimum entry is the next victim.
pub struct LruKReplacer {
    k: usize,
    replacer_size: usize,
    inner: Mutex<ReplacerInner>,
}

struct ReplacerInner {
    frames: HashMap<FrameId, FrameState>,
    /// front timestamp -> frame id, evictable frames only
    candidates: BTreeMap<Timestamp, FrameId>,
    /// Monotonic clock; also salts the per-frame sentinels so they stay
    /// unique.
    current_ts: Timestamp,
    evictable_count: usize,
}

impl LruKReplacer {
    /// Creates a replacer tracking up to `replacer_size` frames with the
    /// given K.
    pub fn new(replacer_size: usize, k: usize) -> Self {
        assert!(k >= 1, "k must be at least 1");
        Self {
            k,
            replacer_size,
            inner: Mutex::new(ReplacerInner {
                frames: HashMap::new(),
                candidates: BTreeMap::new(),
                current_ts: 0,
                evictable_count: 0,
            }),
        }
    }

    /// Records an access to `frame_id` at the current timestamp.
    ///
    /// Out-of-range frame ids are a programming error.
    pub fn record_access(&self, frame_id: FrameId) {
        assert!(
            frame_id.as_usize() < self.replacer_size,
            "frame id {frame_id} out of range (replacer size {})",
            self.replacer_size
        );

        let inner = &mut *self.inner.lock();

        // Unique stamp below every real timestamp; stands in for the
        // K-th-most-recent access until the frame has K real ones.
        let sentinel = Timestamp::MIN + inner.current_ts;
        let state = inner.frames.entry(frame_id).or_insert_with(|| {
            let mut history = VecDeque::with_capacity(self.k + 1);
            history.push_back(sentinel);
            FrameState {
                history,
                evictable: false,
            }
        });

        let ts = inner.current_ts;
        inner.current_ts += 1;

        state.history.push_back(ts);
        if state.history.len() > self.k {
            let old_front = state.history.pop_front().unwrap();
            if state.evictable {
                inner.candidates.remove(&old_front);
                inner
                    .candidates
                    .insert(*state.history.front().unwrap(), frame_id);
            }
        }
    }

    /// Sets whether `frame_id` may be evicted. Idempotent in the same
    /// state. The frame must be tracked.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        let inner = &mut *self.inner.lock();

        let state = inner
            .frames
            .get_mut(&frame_id)
            .unwrap_or_else(|| panic!("set_evictable on untracked frame {frame_id}"));

        if !state.evictable && evictable {
            inner
                .candidates
                .insert(*state.history.front().unwrap(), frame_id);
            inner.evictable_count += 1;
        } else if state.evictable && !evictable {
            inner.candidates.remove(state.history.front().unwrap());
            inner.evictable_count -= 1;
        }
        state.evictable = evictable;
    }

    /// Evicts the frame with the largest backward K-distance and drops its
    /// history. Returns None when no frame is evictable.
    pub fn evict(&self) -> Option<FrameId> {
        let inner = &mut *self.inner.lock();

        let (_, frame_id) = inner.candidates.pop_first()?;
        inner.frames.remove(&frame_id);
        inner.evictable_count -= 1;
        Some(frame_id)
    }

    /// Force-removes a tracked frame, dropping its history. The frame must
    /// be evictable.
    pub fn remove(&self, frame_id: FrameId) {
        let inner = &mut *self.inner.lock();

        let state = inner
            .frames
            .remove(&frame_id)
            .unwrap_or_else(|| panic!("remove of untracked frame {frame_id}"));
        assert!(
            state.evictable,
            "remove of non-evictable frame {frame_id}"
        );

        inner.candidates.remove(state.history.front().unwrap());
        inner.evictable_count -= 1;
    }

    /// Returns the number of evictable frames.
    pub fn size(&self) -> usize {
        self.inner.lock().evictable_count
    }

    /// Returns the K this replacer ranks by.
    pub fn k(&self) -> usize {
        self.k
    }
}
