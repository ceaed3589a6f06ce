//! Bounded caches for region queries
//!
//! Overlap refinement asks the annotation store for every transcript
//! alignment in a region, which is expensive and repeats for nearby probes.
//! [`RegionCache`] memoizes those answers per `(chromosome, start, end)`.
//! It is constructed explicitly and handed to the lookup, so tests and
//! callers control its size and lifetime.
//!
//! # Example
//!
//! ```
//! use ferro_probemap::cache::{LruCache, RegionKey};
//!
//! let cache: LruCache<RegionKey, usize> = LruCache::new(200);
//! let key = RegionKey::new("chr1", 100, 200);
//! cache.insert(key.clone(), 3);
//! assert_eq!(cache.get(&key), Some(3));
//! println!("Cache stats: {:?}", cache.stats());
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::coords::strip_prefix;
use crate::error::ProbeMapError;
use crate::model::Gene;

/// Default number of regions kept by [`RegionCache`].
pub const DEFAULT_REGION_CACHE_CAPACITY: usize = 200;

/// Statistics for cache usage
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of items currently in cache
    pub size: usize,
    /// Maximum cache capacity
    pub capacity: usize,
    /// Number of evictions
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.hit_rate()
    }
}

/// Thread-safe LRU cache implementation
///
/// Each entry records the tick of its last access. Reads bump the tick
/// under the shared lock, so lookups from many threads do not serialize.
pub struct LruCache<K: Hash + Eq + Clone, V: Clone> {
    /// Cache entries with their last-access tick
    entries: RwLock<HashMap<K, (V, AtomicU64)>>,
    /// Maximum capacity
    capacity: usize,
    /// Access counter for LRU tracking
    access_counter: AtomicU64,
    /// Hit counter
    hits: AtomicU64,
    /// Miss counter
    misses: AtomicU64,
    /// Eviction counter
    evictions: AtomicU64,
}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
    /// Create a new LRU cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity)),
            capacity,
            access_counter: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    // A panic while holding the lock cannot leave the map half-updated, so
    // a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, (V, AtomicU64)>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, (V, AtomicU64)>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    fn tick(&self) -> u64 {
        self.access_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Get a value from the cache, marking it as recently used
    ///
    /// Statistics counters use `Relaxed` ordering; counts may be slightly
    /// inconsistent under heavy concurrent access.
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.read();
        if let Some((value, access)) = entries.get(key) {
            access.store(self.tick(), Ordering::Relaxed);
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(value.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Insert a value into the cache
    pub fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        let access = self.tick();
        let mut entries = self.write();

        // Evict if at capacity
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            self.evict_lru(&mut entries);
        }

        entries.insert(key, (value, AtomicU64::new(access)));
    }

    /// Get a cached value, or compute and cache it
    ///
    /// Two threads missing on the same key may both compute; the later
    /// insert wins. Errors are returned without caching.
    pub fn get_or_try_insert_with<E, F>(&self, key: &K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key.clone(), value.clone());
        Ok(value)
    }

    /// Evict the least recently used entry
    fn evict_lru(&self, entries: &mut HashMap<K, (V, AtomicU64)>) {
        if let Some(lru_key) = entries
            .iter()
            .min_by_key(|(_, (_, access))| access.load(Ordering::Relaxed))
            .map(|(k, _)| k.clone())
        {
            entries.remove(&lru_key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Check whether a key is cached, without touching statistics or recency
    pub fn contains(&self, key: &K) -> bool {
        self.read().contains_key(key)
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.read();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: entries.len(),
            capacity: self.capacity,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Get the number of items in the cache
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Key for a region query.
///
/// The chromosome is normalized so `chr1` and `1` share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegionKey {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
}

impl RegionKey {
    pub fn new(chromosome: &str, start: u64, end: u64) -> Self {
        Self {
            chromosome: strip_prefix(chromosome).to_string(),
            start,
            end,
        }
    }
}

/// Cache of transcript alignments found in a region.
pub struct RegionCache {
    cache: LruCache<RegionKey, Arc<Vec<Gene>>>,
}

impl RegionCache {
    /// Create a new region cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Get the genes for a region, querying on a miss
    pub fn get_or_fetch<F>(&self, key: &RegionKey, fetch: F) -> Result<Arc<Vec<Gene>>, ProbeMapError>
    where
        F: FnOnce() -> Result<Vec<Gene>, ProbeMapError>,
    {
        self.cache
            .get_or_try_insert_with(key, || fetch().map(Arc::new))
    }

    /// Get the genes for a region from the cache only
    pub fn get(&self, key: &RegionKey) -> Option<Arc<Vec<Gene>>> {
        self.cache.get(key)
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Get the number of cached regions
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for RegionCache {
    fn default() -> Self {
        Self::new(DEFAULT_REGION_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_cache_basic() {
        let cache: LruCache<String, i32> = LruCache::new(3);

        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("c".to_string(), 3);

        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), Some(2));
        assert_eq!(cache.get(&"c".to_string()), Some(3));
        assert_eq!(cache.get(&"d".to_string()), None);
    }

    #[test]
    fn test_lru_cache_eviction() {
        let cache: LruCache<String, i32> = LruCache::new(2);

        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("c".to_string(), 3); // Should evict "a"

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&"a".to_string()));
        assert!(cache.contains(&"b".to_string()));
        assert!(cache.contains(&"c".to_string()));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_read_refreshes_recency() {
        let cache: LruCache<String, i32> = LruCache::new(2);

        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.get(&"a".to_string());
        cache.insert("c".to_string(), 3); // Should evict "b"

        assert!(cache.contains(&"a".to_string()));
        assert!(!cache.contains(&"b".to_string()));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache: LruCache<String, i32> = LruCache::new(0);
        cache.insert("a".to_string(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_stats() {
        let cache: LruCache<String, i32> = LruCache::new(10);

        cache.insert("a".to_string(), 1);
        cache.get(&"a".to_string()); // Hit
        cache.get(&"b".to_string()); // Miss

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate() - 50.0).abs() < 0.01);
        assert!((stats.miss_rate() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_get_or_try_insert_with() {
        let cache: LruCache<String, i32> = LruCache::new(4);
        let mut calls = 0;

        let v: Result<i32, ()> = cache.get_or_try_insert_with(&"k".to_string(), || {
            calls += 1;
            Ok(7)
        });
        assert_eq!(v, Ok(7));

        let v: Result<i32, ()> = cache.get_or_try_insert_with(&"k".to_string(), || {
            calls += 1;
            Ok(8)
        });
        assert_eq!(v, Ok(7));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: LruCache<String, i32> = LruCache::new(4);
        let v: Result<i32, &str> = cache.get_or_try_insert_with(&"k".to_string(), || Err("down"));
        assert!(v.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_region_key_normalizes_prefix() {
        assert_eq!(RegionKey::new("chr1", 10, 20), RegionKey::new("1", 10, 20));
    }

    #[test]
    fn test_region_cache_fetches_once() {
        let cache = RegionCache::new(2);
        let key = RegionKey::new("chr1", 100, 200);

        let first = cache.get_or_fetch(&key, || Ok(Vec::new())).unwrap();
        assert!(first.is_empty());
        let second = cache
            .get_or_fetch(&key, || Err(ProbeMapError::lookup("should not be called")))
            .unwrap();
        assert!(second.is_empty());
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.len(), 1);
    }
}
