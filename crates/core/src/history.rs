//! Bounded correlation history.
//!
//! One insertion-ordered map per direction, keyed by the source message id.
//! Entries are never promoted on access, so the map evicts strictly in
//! insertion order once a direction reaches capacity.

use std::{num::NonZeroUsize, sync::Mutex};

use {
    chatbridge_common::{MessageHandle, NativeId, Platform},
    lru::LruCache,
    tracing::debug,
};

#[cfg(feature = "metrics")]
use chatbridge_metrics::{counter, gauge, history as history_metrics, labels};

/// A live link between a source message and its mirror on the other platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    pub source: MessageHandle,
    pub mirror: MessageHandle,
    /// Sender name captured when the mirror was created; reused on edit.
    pub attribution: Option<String>,
}

pub struct HistoryStore {
    capacity: NonZeroUsize,
    a_to_b: Mutex<LruCache<NativeId, Correlation>>,
    b_to_a: Mutex<LruCache<NativeId, Correlation>>,
}

fn direction(platform: Platform) -> &'static str {
    match platform {
        Platform::A => "a_to_b",
        Platform::B => "b_to_a",
    }
}

impl HistoryStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            a_to_b: Mutex::new(LruCache::new(capacity)),
            b_to_a: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn map(&self, source: Platform) -> &Mutex<LruCache<NativeId, Correlation>> {
        match source {
            Platform::A => &self.a_to_b,
            Platform::B => &self.b_to_a,
        }
    }

    /// Record that `mirror` is the counterpart of `source`.
    ///
    /// Returns the correlation evicted to make room, if the direction was full.
    /// Re-putting an existing source replaces its entry and counts as a fresh
    /// insertion.
    pub fn put(
        &self,
        source: MessageHandle,
        mirror: MessageHandle,
        attribution: Option<String>,
    ) -> Option<Correlation> {
        let platform = source.platform;
        let key = source.id.clone();
        let correlation = Correlation {
            source,
            mirror,
            attribution,
        };

        let (evicted, len) = {
            let mut map = self.map(platform).lock().unwrap_or_else(|e| e.into_inner());
            // Drop any existing entry so `push` only ever returns an eviction.
            map.pop(&key);
            let evicted = map.push(key, correlation).map(|(_, old)| old);
            (evicted, map.len())
        };

        #[cfg(feature = "metrics")]
        gauge!(history_metrics::ENTRIES, labels::DIRECTION => direction(platform)).set(len as f64);

        if let Some(ref old) = evicted {
            debug!(
                direction = direction(platform),
                source = %old.source.id,
                len,
                "history full, evicted oldest correlation"
            );
            #[cfg(feature = "metrics")]
            counter!(history_metrics::EVICTIONS_TOTAL, labels::DIRECTION => direction(platform))
                .increment(1);
        }
        evicted
    }

    /// The correlation whose source is `handle`, if still remembered.
    pub fn get_counterpart(&self, handle: &MessageHandle) -> Option<Correlation> {
        let map = self
            .map(handle.platform)
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        map.peek(&handle.id).cloned()
    }

    /// Remove and return the correlation whose source is `handle`.
    pub fn remove(&self, handle: &MessageHandle) -> Option<Correlation> {
        let (removed, len) = {
            let mut map = self
                .map(handle.platform)
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            (map.pop(&handle.id), map.len())
        };

        #[cfg(feature = "metrics")]
        gauge!(history_metrics::ENTRIES, labels::DIRECTION => direction(handle.platform))
            .set(len as f64);
        #[cfg(not(feature = "metrics"))]
        let _ = len;

        removed
    }

    /// Swap the stored mirror of `source` to `new`, but only if it is still
    /// `expected`. Returns whether the entry was updated.
    ///
    /// Insertion order is unchanged.
    pub fn replace_mirror(
        &self,
        source: &MessageHandle,
        expected: &MessageHandle,
        new: MessageHandle,
    ) -> bool {
        let mut map = self
            .map(source.platform)
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        match map.peek_mut(&source.id) {
            Some(entry) if entry.mirror == *expected => {
                entry.mirror = new;
                true
            },
            _ => false,
        }
    }

    /// Number of correlations whose source is on `platform`.
    pub fn len(&self, platform: Platform) -> usize {
        self.map(platform)
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(capacity: usize) -> HistoryStore {
        HistoryStore::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn a(id: &str) -> MessageHandle {
        MessageHandle::new(Platform::A, id, "general")
    }

    fn b(id: u64) -> MessageHandle {
        MessageHandle::new(Platform::B, id, "bot_control")
    }

    #[test]
    fn put_then_get() {
        let h = store(4);
        h.put(a("1.1"), b(10), Some("randy".into()));
        let c = h.get_counterpart(&a("1.1")).unwrap();
        assert_eq!(c.mirror, b(10));
        assert_eq!(c.attribution.as_deref(), Some("randy"));
    }

    #[test]
    fn evicts_first_inserted_only() {
        let h = store(3);
        for i in 1..=3 {
            assert!(h.put(a(&format!("1.{i}")), b(i), None).is_none());
        }
        // Lookups do not promote.
        assert!(h.get_counterpart(&a("1.1")).is_some());

        let evicted = h.put(a("1.4"), b(4), None).unwrap();
        assert_eq!(evicted.source, a("1.1"));
        assert!(h.get_counterpart(&a("1.1")).is_none());
        for i in 2..=4 {
            assert!(h.get_counterpart(&a(&format!("1.{i}"))).is_some());
        }
        assert_eq!(h.len(Platform::A), 3);
    }

    #[test]
    fn never_exceeds_capacity() {
        let h = store(5);
        for i in 0..50u64 {
            h.put(a(&format!("2.{i}")), b(i), None);
            if i % 3 == 0 {
                h.remove(&a(&format!("2.{}", i / 2)));
            }
            h.get_counterpart(&a("2.0"));
            assert!(h.len(Platform::A) <= 5);
        }
        assert_eq!(h.len(Platform::B), 0);
    }

    #[test]
    fn directions_are_independent() {
        let h = store(1);
        h.put(a("1.1"), b(10), None);
        h.put(b(20), a("2.2"), None);
        assert_eq!(h.len(Platform::A), 1);
        assert_eq!(h.len(Platform::B), 1);
        // A mirror handle is not a key in the reverse direction.
        assert!(h.get_counterpart(&b(10)).is_none());
    }

    #[test]
    fn get_after_remove_is_none() {
        let h = store(4);
        h.put(a("1.1"), b(10), None);
        assert!(h.remove(&a("1.1")).is_some());
        assert!(h.get_counterpart(&a("1.1")).is_none());
        assert!(h.remove(&a("1.1")).is_none());
    }

    #[test]
    fn removed_entry_frees_its_slot() {
        let h = store(2);
        h.put(a("1.1"), b(1), None);
        h.put(a("1.2"), b(2), None);
        h.remove(&a("1.1"));
        assert!(h.put(a("1.3"), b(3), None).is_none());
        assert!(h.get_counterpart(&a("1.2")).is_some());
    }

    #[test]
    fn replace_mirror_is_compare_and_update() {
        let h = store(4);
        h.put(a("1.1"), b(10), None);
        assert!(!h.replace_mirror(&a("1.1"), &b(99), b(11)));
        assert!(h.replace_mirror(&a("1.1"), &b(10), b(11)));
        assert_eq!(h.get_counterpart(&a("1.1")).unwrap().mirror, b(11));
        assert!(!h.replace_mirror(&a("9.9"), &b(11), b(12)));
    }

    #[test]
    fn replace_mirror_keeps_insertion_order() {
        let h = store(2);
        h.put(a("1.1"), b(1), None);
        h.put(a("1.2"), b(2), None);
        h.replace_mirror(&a("1.1"), &b(1), b(5));
        let evicted = h.put(a("1.3"), b(3), None).unwrap();
        assert_eq!(evicted.source, a("1.1"));
    }

    #[test]
    fn reput_counts_as_fresh_insertion() {
        let h = store(2);
        h.put(a("1.1"), b(1), None);
        h.put(a("1.2"), b(2), None);
        assert!(h.put(a("1.1"), b(3), None).is_none());
        let evicted = h.put(a("1.4"), b(4), None).unwrap();
        assert_eq!(evicted.source, a("1.2"));
    }
}
