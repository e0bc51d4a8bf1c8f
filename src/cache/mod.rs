//! Kernel value cache
//!
//! SMO evaluates K(i, j) for the same index pairs over and over. Values are
//! kept in an LRU keyed by the unordered pair, so K(i, j) and K(j, i) share
//! one slot.

use lru::LruCache;
use std::num::NonZeroUsize;

/// Approximate bytes one cached pair occupies (key, value and bookkeeping)
pub const BYTES_PER_ENTRY: usize = 16;

/// Default memory budget for kernel values (100 MB)
pub const DEFAULT_CACHE_BYTES: usize = 100_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PairKey {
    lo: usize,
    hi: usize,
}

impl PairKey {
    fn new(i: usize, j: usize) -> Self {
        Self {
            lo: i.min(j),
            hi: i.max(j),
        }
    }
}

/// LRU cache of kernel values indexed by training-point pairs
pub struct KernelCache {
    entries: LruCache<PairKey, f64>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Cache holding at most `capacity` pair values
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Cache sized to a memory budget in bytes
    pub fn with_memory_limit(memory_bytes: usize) -> Self {
        Self::new(memory_bytes / BYTES_PER_ENTRY)
    }

    /// Cache for `n` points: the full triangular kernel matrix, or as much
    /// of it as fits in `memory_bytes`
    pub fn for_points(n: usize, memory_bytes: usize) -> Self {
        let triangle = n.saturating_mul(n.saturating_add(1)) / 2;
        Self::new(triangle.min(memory_bytes / BYTES_PER_ENTRY))
    }

    pub fn get(&mut self, i: usize, j: usize) -> Option<f64> {
        match self.entries.get(&PairKey::new(i, j)) {
            Some(&value) => {
                self.hits += 1;
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, i: usize, j: usize, value: f64) {
        self.entries.put(PairKey::new(i, j), value);
    }

    /// Cached value for `(i, j)`, computing and storing it on a miss
    pub fn get_or_compute<F: FnOnce() -> f64>(&mut self, i: usize, j: usize, compute: F) -> f64 {
        if let Some(value) = self.get(i, j) {
            return value;
        }
        let value = compute();
        self.put(i, j, value);
        value
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.entries.cap().get(),
            size: self.entries.len(),
        }
    }

    /// Drop every value and reset the counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

/// Snapshot of cache usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_unordered() {
        assert_eq!(PairKey::new(1, 5), PairKey::new(5, 1));
        assert_eq!(PairKey::new(5, 1).lo, 1);
    }

    #[test]
    fn test_symmetric_lookup() {
        let mut cache = KernelCache::new(3);
        assert_eq!(cache.get(0, 1), None);
        cache.put(0, 1, 5.0);
        assert_eq!(cache.get(1, 0), Some(5.0));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_get_or_compute_runs_once() {
        let mut cache = KernelCache::for_points(4, DEFAULT_CACHE_BYTES);
        let mut calls = 0;
        for _ in 0..3 {
            let v = cache.get_or_compute(2, 3, || {
                calls += 1;
                0.25
            });
            assert_eq!(v, 0.25);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.hit_rate(), 2.0 / 3.0);
    }

    #[test]
    fn test_triangular_capacity() {
        assert_eq!(KernelCache::for_points(4, DEFAULT_CACHE_BYTES).stats().capacity, 10);
        assert_eq!(KernelCache::for_points(0, DEFAULT_CACHE_BYTES).stats().capacity, 1);
    }

    #[test]
    fn test_memory_limit_caps_capacity() {
        assert_eq!(KernelCache::with_memory_limit(1600).stats().capacity, 100);
        assert_eq!(KernelCache::with_memory_limit(0).stats().capacity, 1);

        // 100k points would need ~5e9 pairs; the budget wins
        let cache = KernelCache::for_points(100_000, 16_000);
        assert_eq!(cache.stats().capacity, 1000);

        let huge = KernelCache::for_points(usize::MAX, 1600);
        assert_eq!(huge.stats().capacity, 100);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = KernelCache::new(2);
        cache.put(0, 1, 1.0);
        cache.put(1, 2, 2.0);
        cache.put(2, 3, 3.0);

        assert_eq!(cache.get(0, 1), None);
        assert_eq!(cache.get(1, 2), Some(2.0));
        assert_eq!(cache.get(3, 2), Some(3.0));
    }

    #[test]
    fn test_clear_resets_counters() {
        let mut cache = KernelCache::new(10);
        cache.put(0, 1, 1.0);
        cache.get(0, 1);
        cache.clear();

        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.get(0, 1), None);
        assert_eq!(cache.stats().misses, 1);
    }
}
