//! LRU-K replacement policy.
//!
//! Evicts the frame with the largest backward K-distance: the frame whose
//! K-th most recent access lies furthest in the past. Frames with fewer
//! than K recorded accesses have infinite K-distance and are preferred
//! victims, FIFO-ordered by first access.

use std::collections::VecDeque;

use crate::common::FrameId;

/// The LRU-K eviction policy.
///
/// Frames live in one of two lists:
/// - **history**: frames with fewer than K accesses, most recent *first*
///   access at the front. The tail is the oldest newcomer, so a
///   tail-to-head scan realizes FIFO eviction among them.
/// - **cache**: frames with at least K accesses, most recent access at
///   the front. The tail is the frame touched longest ago, so a
///   tail-to-head scan realizes LRU among them.
///
/// Eviction consults history first: a frame that never earned K accesses
/// is always a better victim than one that did.
///
/// Only frames marked evictable are candidates. The buffer pool keeps
/// pinned frames non-evictable.
pub struct LruKReplacer {
    /// The K of LRU-K.
    k: usize,

    /// Number of frames the replacer tracks; valid ids are [0, num_frames).
    num_frames: usize,

    /// Total recorded accesses per frame. Zero means unknown to the lists.
    use_count: Vec<usize>,

    /// Per-frame evictable flag.
    evictable: Vec<bool>,

    /// Frames with use_count < k, most recent first access at the front.
    history: VecDeque<FrameId>,

    /// Frames with use_count >= k, most recent access at the front.
    cache: VecDeque<FrameId>,

    /// Number of frames currently marked evictable.
    curr_size: usize,
}

impl LruKReplacer {
    /// Create a replacer tracking `num_frames` frames with parameter `k`.
    ///
    /// # Panics
    /// Panics if `k` is 0.
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k > 0, "replacer k must be > 0");
        Self {
            k,
            num_frames,
            use_count: vec![0; num_frames],
            evictable: vec![false; num_frames],
            history: VecDeque::new(),
            cache: VecDeque::new(),
            curr_size: 0,
        }
    }

    /// Record that a frame was accessed.
    ///
    /// On the K-th access the frame graduates from history to the front of
    /// the cache list; further accesses move it back to the front. Below K
    /// the frame keeps its history position (first-access order).
    ///
    /// # Panics
    /// Panics if `frame_id` is out of range.
    pub fn record_access(&mut self, frame_id: FrameId) {
        self.check_frame(frame_id);

        let id = frame_id.0;
        self.use_count[id] += 1;

        if self.use_count[id] == self.k {
            // Graduate from history to cache
            remove_from(&mut self.history, frame_id);
            self.cache.push_front(frame_id);
        } else if self.use_count[id] > self.k {
            // Refresh recency within the cache
            remove_from(&mut self.cache, frame_id);
            self.cache.push_front(frame_id);
        } else if !self.history.contains(&frame_id) {
            // First access: the position in history never changes afterwards
            self.history.push_front(frame_id);
        }
    }

    /// Toggle whether a frame may be evicted.
    ///
    /// A frame with no recorded accesses is unknown here; the call is a
    /// no-op for it. `curr_size` tracks the number of evictable frames.
    ///
    /// # Panics
    /// Panics if `frame_id` is out of range.
    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        self.check_frame(frame_id);

        let id = frame_id.0;
        if self.use_count[id] == 0 {
            return;
        }

        if self.evictable[id] && !evictable {
            self.curr_size -= 1;
        }
        if !self.evictable[id] && evictable {
            self.curr_size += 1;
        }
        self.evictable[id] = evictable;
    }

    /// Select a victim frame and forget its access history.
    ///
    /// Scans the history list tail-to-head (earliest first access wins),
    /// then the cache list tail-to-head (least recently accessed wins).
    /// Returns `None` when no evictable frame exists.
    pub fn evict(&mut self) -> Option<FrameId> {
        let idx = self.history.iter().rposition(|&f| self.evictable[f.0]);
        let mut victim = idx.and_then(|i| self.history.remove(i));

        if victim.is_none() {
            let idx = self.cache.iter().rposition(|&f| self.evictable[f.0]);
            victim = idx.and_then(|i| self.cache.remove(i));
        }

        if let Some(frame_id) = victim {
            self.clear_frame(frame_id);
        }
        victim
    }

    /// Forcibly remove a frame from the replacer, whatever its position.
    ///
    /// Unlike [`evict`](Self::evict) this ignores the replacement policy.
    /// A frame with no recorded accesses is a no-op.
    ///
    /// # Panics
    /// Panics if `frame_id` is out of range.
    pub fn remove(&mut self, frame_id: FrameId) {
        self.check_frame(frame_id);

        if self.use_count[frame_id.0] == 0 {
            return;
        }

        if self.use_count[frame_id.0] < self.k {
            remove_from(&mut self.history, frame_id);
        } else {
            remove_from(&mut self.cache, frame_id);
        }
        if self.evictable[frame_id.0] {
            self.curr_size -= 1;
        }
        self.use_count[frame_id.0] = 0;
        self.evictable[frame_id.0] = false;
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.curr_size
    }

    fn clear_frame(&mut self, frame_id: FrameId) {
        self.use_count[frame_id.0] = 0;
        self.evictable[frame_id.0] = false;
        self.curr_size -= 1;
    }

    fn check_frame(&self, frame_id: FrameId) {
        assert!(
            frame_id.0 < self.num_frames,
            "frame id out of range: {} (replacer tracks {})",
            frame_id,
            self.num_frames
        );
    }
}

/// Remove `frame_id` from `list` if present.
fn remove_from(list: &mut VecDeque<FrameId>, frame_id: FrameId) {
    if let Some(idx) = list.iter().position(|&f| f == frame_id) {
        let _ = list.remove(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(id: usize) -> FrameId {
        FrameId::new(id)
    }

    #[test]
    fn test_prefers_history_over_cache() {
        let mut replacer = LruKReplacer::new(2, 2);

        // Frame 0 reaches K accesses, frame 1 does not
        replacer.record_access(fid(0));
        replacer.record_access(fid(0));
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);

        // The under-accessed frame goes first
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(0)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_history_is_fifo_by_first_access() {
        let mut replacer = LruKReplacer::new(3, 2);

        replacer.record_access(fid(0));
        replacer.record_access(fid(1));
        replacer.record_access(fid(2));
        // Re-accessing below K must not reorder history
        replacer.record_access(fid(0));

        // 0 graduated to cache at its second access; 1 and 2 stay FIFO
        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);
        replacer.set_evictable(fid(2), true);

        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(0)));
    }

    #[test]
    fn test_classic_sequence() {
        let mut replacer = LruKReplacer::new(7, 2);

        // Add six frames. Frame 6 is non-evictable.
        for id in 1..=6 {
            replacer.record_access(fid(id));
        }
        for id in 1..=5 {
            replacer.set_evictable(fid(id), true);
        }
        replacer.set_evictable(fid(6), false);
        assert_eq!(replacer.size(), 5);

        // Frame 1 gets a second access and graduates to the cache list.
        // Eviction order among the rest is now [2,3,4,5,1].
        replacer.record_access(fid(1));

        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(3)));
        assert_eq!(replacer.evict(), Some(fid(4)));
        assert_eq!(replacer.size(), 2);

        // Reinsert 3 and 4, graduate 5 and 4. Order becomes [3,1,5,4].
        replacer.record_access(fid(3));
        replacer.record_access(fid(4));
        replacer.record_access(fid(5));
        replacer.record_access(fid(4));
        replacer.set_evictable(fid(3), true);
        replacer.set_evictable(fid(4), true);
        assert_eq!(replacer.size(), 4);

        assert_eq!(replacer.evict(), Some(fid(3)));
        assert_eq!(replacer.size(), 3);

        // Frame 6 still has a single access: max backward K-distance.
        replacer.set_evictable(fid(6), true);
        assert_eq!(replacer.size(), 4);
        assert_eq!(replacer.evict(), Some(fid(6)));
        assert_eq!(replacer.size(), 3);

        replacer.set_evictable(fid(1), false);
        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.evict(), Some(fid(5)));
        assert_eq!(replacer.size(), 1);

        replacer.record_access(fid(1));
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(1), true);
        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.evict(), Some(fid(4)));

        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.size(), 0);

        // Nothing left: these must not disturb the size
        assert_eq!(replacer.evict(), None);
        assert_eq!(replacer.size(), 0);
        replacer.remove(fid(1));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_set_evictable_unknown_frame_is_noop() {
        let mut replacer = LruKReplacer::new(4, 2);

        // No recorded access: cannot become evictable
        replacer.set_evictable(fid(3), true);
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_remove_clears_history() {
        let mut replacer = LruKReplacer::new(4, 2);

        replacer.record_access(fid(0));
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);
        assert_eq!(replacer.size(), 2);

        replacer.remove(fid(0));
        assert_eq!(replacer.size(), 1);

        // The removed frame starts over in history
        replacer.record_access(fid(0));
        replacer.record_access(fid(2));
        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(2), true);

        // 1 kept its original first-access position; 0 re-entered later
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(0)));
        assert_eq!(replacer.evict(), Some(fid(2)));
    }

    #[test]
    fn test_remove_non_evictable_frame() {
        let mut replacer = LruKReplacer::new(4, 2);

        replacer.record_access(fid(0));
        assert_eq!(replacer.size(), 0);

        // Removal works regardless of the evictable flag
        replacer.remove(fid(0));
        assert_eq!(replacer.size(), 0);
        replacer.set_evictable(fid(0), true);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_cache_is_lru_by_latest_access() {
        let mut replacer = LruKReplacer::new(3, 2);

        // All three graduate; access order makes 0 the coldest
        replacer.record_access(fid(0));
        replacer.record_access(fid(0));
        replacer.record_access(fid(1));
        replacer.record_access(fid(1));
        replacer.record_access(fid(2));
        replacer.record_access(fid(2));
        // Touch 0 again: now 1 is the coldest
        replacer.record_access(fid(0));

        for id in 0..3 {
            replacer.set_evictable(fid(id), true);
        }

        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(0)));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_panics() {
        let mut replacer = LruKReplacer::new(2, 2);
        replacer.record_access(fid(2));
    }
}
