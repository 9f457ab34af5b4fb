//! Bounded LRU cache for conversion results.
//!
//! Entries are keyed by the exact input (plus whatever the caller folds into the key) and
//! hold the result behind an `Arc`, so a hit is a pointer copy. Each entry counts its own
//! hits. The cache also keeps aggregate hit/miss counters for [`CacheStats`].
//!
//! Storing never fails: a value either lands in the cache or, with capacity 0, the cache
//! is disabled and every lookup is a miss.

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct Entry<V> {
    value: Arc<V>,
    hits: u64,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, 0.0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe LRU cache with per-entry hit counters.
pub struct ConversionCache<V> {
    entries: Option<Mutex<LruCache<String, Entry<V>>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> ConversionCache<V> {
    /// A cache holding at most `capacity` entries. Capacity 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        ConversionCache {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Look up `key`, marking it most recently used and counting the hit.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let found = self.entries.as_ref().and_then(|entries| {
            let mut entries = entries.lock();
            entries.get_mut(key).map(|entry| {
                entry.hits += 1;
                Arc::clone(&entry.value)
            })
        });
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store a value, evicting the least recently used entry when full.
    pub fn insert(&self, key: impl Into<String>, value: Arc<V>) {
        if let Some(entries) = &self.entries {
            entries.lock().put(key.into(), Entry { value, hits: 0 });
        }
    }

    /// Hits recorded for `key` since it was stored, without touching its recency.
    pub fn hit_count(&self, key: &str) -> Option<u64> {
        self.entries
            .as_ref()
            .and_then(|entries| entries.lock().peek(key).map(|entry| entry.hits))
    }

    pub fn len(&self) -> usize {
        self.entries
            .as_ref()
            .map_or(0, |entries| entries.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Aggregate counters are kept.
    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<V> std::fmt::Debug for ConversionCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionCache")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_increments_entry_and_aggregate_counters() {
        let cache = ConversionCache::new(4);
        cache.insert("a", Arc::new(1));
        assert_eq!(cache.get("a").as_deref(), Some(&1));
        assert_eq!(cache.get("a").as_deref(), Some(&1));
        assert!(cache.get("b").is_none());
        assert_eq!(cache.hit_count("a"), Some(2));
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (2, 1));
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = ConversionCache::new(2);
        cache.insert("a", Arc::new("a"));
        cache.insert("b", Arc::new("b"));
        cache.get("a");
        cache.insert("c", Arc::new("c"));
        assert!(cache.hit_count("b").is_none());
        assert!(cache.hit_count("a").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_disables() {
        let cache = ConversionCache::new(0);
        cache.insert("a", Arc::new(1));
        assert!(!cache.is_enabled());
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_keeps_counters() {
        let cache = ConversionCache::new(2);
        cache.insert("a", Arc::new(1));
        cache.get("a");
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 1);
    }
}
