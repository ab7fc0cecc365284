//! Bounded result cache keyed by text fingerprint
//!
//! Eviction is by insertion order, not access order: once the cache grows
//! past capacity the oldest-inserted batch is dropped, however recently those
//! entries were read. Each instance is guarded by one mutex covering both
//! reads and writes.

use econsult_core::Fingerprint;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: u64,
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<Fingerprint, CacheEntry<V>>,
    /// insertion sequence -> key, oldest first
    order: BTreeMap<u64, Fingerprint>,
    next_seq: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V> CacheState<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
    pub evictions: u64,
    pub capacity: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe FIFO-evicting map from [`Fingerprint`] to a cloned artifact.
pub struct ResultCache<V> {
    name: &'static str,
    capacity: usize,
    eviction_batch: usize,
    state: Mutex<CacheState<V>>,
}

impl<V: Clone> ResultCache<V> {
    /// Create a cache. A zero capacity or batch is raised to one, and the
    /// batch is capped at the capacity.
    pub fn new(name: &'static str, capacity: usize, eviction_batch: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name,
            capacity,
            eviction_batch: eviction_batch.clamp(1, capacity),
            state: Mutex::new(CacheState::new()),
        }
    }

    // Poisoning is recovered: no mutation below can panic midway.
    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: Fingerprint) -> Option<V> {
        let mut state = self.lock();
        match state.entries.get(&key).map(|entry| entry.value.clone()) {
            Some(value) => {
                state.hits += 1;
                Some(value)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Store `value` under `key`.
    ///
    /// Overwriting an existing key keeps its original insertion position.
    /// When the insert pushes the size past capacity, the oldest
    /// `eviction_batch` entries are removed before the lock is released.
    pub fn put(&self, key: Fingerprint, value: V) {
        let mut state = self.lock();

        if let Some(entry) = state.entries.get_mut(&key) {
            entry.value = value;
            return;
        }

        let inserted_at = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(key, CacheEntry { value, inserted_at });
        state.order.insert(inserted_at, key);

        if state.entries.len() > self.capacity {
            let mut evicted = 0u64;
            for _ in 0..self.eviction_batch {
                let Some((_, oldest)) = state.order.pop_first() else {
                    break;
                };
                state.entries.remove(&oldest);
                evicted += 1;
            }
            state.evictions += evicted;
            tracing::trace!(
                cache = self.name,
                evicted,
                remaining = state.entries.len(),
                "Evicted oldest cache entries"
            );
        }
    }

    /// Drop one entry, returning its value.
    pub fn remove(&self, key: Fingerprint) -> Option<V> {
        let mut state = self.lock();
        let entry = state.entries.remove(&key)?;
        state.order.remove(&entry.inserted_at);
        Some(entry.value)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: Fingerprint) -> bool {
        self.lock().entries.contains_key(&key)
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entry_count: state.entries.len() as u64,
            evictions: state.evictions,
            capacity: self.capacity as u64,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<V> std::fmt::Debug for ResultCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size = self
            .state
            .lock()
            .map(|s| s.entries.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().entries.len());
        f.debug_struct("ResultCache")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("eviction_batch", &self.eviction_batch)
            .field("current_size", &size)
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(n: u64) -> Fingerprint {
        Fingerprint::from_raw(n)
    }

    #[test]
    fn test_get_put_roundtrip_and_stats() {
        let cache = ResultCache::new("test", 10, 2);
        assert_eq!(cache.get(key(1)), None);
        cache.put(key(1), "one".to_string());
        assert_eq!(cache.get(key(1)).as_deref(), Some("one"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_eviction_removes_oldest_batch() {
        let cache = ResultCache::new("test", 5, 2);
        for n in 0..5 {
            cache.put(key(n), n);
        }
        assert_eq!(cache.len(), 5);

        cache.put(key(5), 5);
        assert_eq!(cache.len(), 4);
        assert!(!cache.contains(key(0)));
        assert!(!cache.contains(key(1)));
        for n in 2..=5 {
            assert!(cache.contains(key(n)));
        }
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_eviction_ignores_recent_reads() {
        let cache = ResultCache::new("test", 3, 1);
        for n in 0..3 {
            cache.put(key(n), n);
        }
        // Reading the oldest entry does not protect it.
        assert_eq!(cache.get(key(0)), Some(0));
        cache.put(key(3), 3);
        assert!(!cache.contains(key(0)));
        assert!(cache.contains(key(1)));
    }

    #[test]
    fn test_overwrite_keeps_insertion_position() {
        let cache = ResultCache::new("test", 2, 1);
        cache.put(key(0), "a");
        cache.put(key(1), "b");
        cache.put(key(0), "c");
        assert_eq!(cache.get(key(0)), Some("c"));

        cache.put(key(2), "d");
        assert!(!cache.contains(key(0)));
        assert!(cache.contains(key(1)));
        assert!(cache.contains(key(2)));
    }

    #[test]
    fn test_new_clamps_parameters() {
        let cache: ResultCache<u8> = ResultCache::new("test", 0, 50);
        assert_eq!(cache.capacity(), 1);
        cache.put(key(1), 1);
        cache.put(key(2), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(key(2)));
    }

    #[test]
    fn test_remove_frees_slot_in_order() {
        let cache = ResultCache::new("test", 2, 1);
        cache.put(key(0), 0);
        cache.put(key(1), 1);
        assert_eq!(cache.remove(key(0)), Some(0));
        assert_eq!(cache.remove(key(0)), None);

        cache.put(key(2), 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_clear() {
        let cache = ResultCache::new("test", 4, 1);
        cache.put(key(1), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_puts_stay_bounded() {
        let cache = Arc::new(ResultCache::new("test", 50, 10));
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for n in 0..200u64 {
                        cache.put(key(t * 1000 + n), n);
                        let _ = cache.get(key(t * 1000 + n));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 50);
    }

    #[test]
    fn test_debug_shows_size() {
        let cache = ResultCache::new("summary", 4, 1);
        cache.put(key(1), 1);
        let debug = format!("{:?}", cache);
        assert!(debug.contains("summary"));
        assert!(debug.contains("current_size: 1"));
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
