//! The sweep's window of "b" records that may still overlap upcoming "a".
//!
//! Records enter in start order. Eviction advances a head index past records
//! that end at or before the current position; records behind the head are
//! dropped in bulk once enough of them pile up. Entries past the head may
//! already be stale when a long record sits in front of them, so readers
//! filter with [`ActiveSet::overlapping`].

use std::sync::Arc;

use crate::interval::Record;

/// Compaction threshold - trigger when head_idx exceeds this value.
const COMPACTION_THRESHOLD: usize = 4096;

/// Active "b" records with head-index eviction.
///
/// # Memory Complexity
///
/// O(k) where k = max number of "b" records spanning any single position,
/// plus at most `COMPACTION_THRESHOLD` evicted slots awaiting compaction.
#[derive(Debug)]
pub struct ActiveSet {
    data: Vec<Arc<Record>>,
    head_idx: usize,
    max_active: usize,
}

impl Default for ActiveSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            head_idx: 0,
            max_active: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, record: Arc<Record>) {
        self.data.push(record);
        self.max_active = self.max_active.max(self.len());
    }

    /// Number of logically active records.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() - self.head_idx
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head_idx >= self.data.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Arc<Record>] {
        &self.data[self.head_idx..]
    }

    /// Drop records at the head that end at or before `position`.
    ///
    /// Returns the number of records removed.
    pub fn expire_before(&mut self, position: u64) -> usize {
        let start_idx = self.head_idx;
        while self.head_idx < self.data.len() && self.data[self.head_idx].stop() <= position {
            self.head_idx += 1;
        }
        self.compact_if_needed();
        self.head_idx - start_idx
    }

    fn compact_if_needed(&mut self) {
        if self.head_idx > COMPACTION_THRESHOLD && self.head_idx * 2 > self.data.len() {
            self.data.drain(0..self.head_idx);
            self.head_idx = 0;
        }
    }

    /// Records overlapping `[start, stop)`, in window order. Empty ranges
    /// and empty records overlap nothing.
    pub fn overlapping(&self, start: u64, stop: u64) -> impl Iterator<Item = &Arc<Record>> {
        let window = if start < stop { self.as_slice() } else { &[] };
        window
            .iter()
            .filter(move |b| !b.is_empty() && b.start() < stop && start < b.stop())
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.head_idx = 0;
    }

    /// Largest window observed (for statistics).
    pub fn max_active(&self) -> usize {
        self.max_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(start: u64, stop: u64) -> Arc<Record> {
        Arc::new(Record::new("chr1", start, stop))
    }

    #[test]
    fn test_active_set_basic() {
        let mut set = ActiveSet::new();
        set.push(rec(100, 200));
        set.push(rec(150, 250));

        assert_eq!(set.len(), 2);
        assert_eq!(set.max_active(), 2);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.max_active(), 2);
    }

    #[test]
    fn test_expire_before() {
        let mut set = ActiveSet::new();
        set.push(rec(100, 200));
        set.push(rec(150, 250));
        set.push(rec(200, 300));

        assert_eq!(set.expire_before(200), 1);
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0].start(), 150);
    }

    #[test]
    fn test_expire_stops_at_long_head() {
        let mut set = ActiveSet::new();
        set.push(rec(0, 1000));
        set.push(rec(10, 20));

        // the short record stays behind the long one but is filtered out
        assert_eq!(set.expire_before(500), 0);
        let hits: Vec<u64> = set.overlapping(500, 600).map(|b| b.start()).collect();
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn test_compaction() {
        let mut set = ActiveSet::new();
        for i in 0..(COMPACTION_THRESHOLD as u64 + 10) {
            set.push(rec(i, i + 1));
        }
        set.expire_before(COMPACTION_THRESHOLD as u64 + 5);
        assert_eq!(set.len(), 5);
        assert_eq!(set.as_slice()[0].start(), COMPACTION_THRESHOLD as u64 + 5);
    }

    #[test]
    fn test_overlapping() {
        let mut set = ActiveSet::new();
        set.push(rec(100, 200));
        set.push(rec(150, 250));
        set.push(rec(300, 400));

        assert_eq!(set.overlapping(175, 225).count(), 2);
        assert_eq!(set.overlapping(350, 450).count(), 1);
        assert_eq!(set.overlapping(500, 600).count(), 0);
        assert_eq!(set.overlapping(200, 200).count(), 0);
    }
}
