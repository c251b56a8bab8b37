//! Bounded, time-expiring cache for detection results.
//!
//! A thin guard over `moka`: least-recently-used eviction at capacity and a
//! fixed TTL. It only sheds load from the indexer; callers must behave the
//! same with it disabled.

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::hash::Hash;
use std::time::Duration;
use tracing::debug;

/// Thread-safe bounded cache with TTL.
pub struct BoundedCache<K, V> {
    /// `None` when capacity or TTL is zero.
    inner: Option<Cache<K, V>>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache holding at most `capacity` entries for `ttl` each.
    /// A zero capacity or zero TTL disables caching.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        if capacity == 0 || ttl.is_zero() {
            debug!("Detection cache disabled (capacity {}, ttl {:?})", capacity, ttl);
            return Self { inner: None };
        }

        let inner = Cache::builder()
            .max_capacity(capacity as u64)
            .time_to_live(ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self { inner: Some(inner) }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Get a live entry. Expired entries are misses.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.as_ref().and_then(|cache| cache.get(key))
    }

    /// Like `get`, without touching recency.
    pub fn has(&self, key: &K) -> bool {
        self.inner
            .as_ref()
            .map(|cache| cache.contains_key(key))
            .unwrap_or(false)
    }

    /// Insert or overwrite. When full, the least recently used entry goes.
    pub fn set(&self, key: K, value: V) {
        if let Some(cache) = &self.inner {
            cache.insert(key, value);
        }
    }

    /// Resident entries after pending evictions are applied.
    pub fn len(&self) -> usize {
        match &self.inner {
            Some(cache) => {
                cache.run_pending_tasks();
                cache.entry_count() as usize
            }
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(30 * 60);

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = BoundedCache::new(10, Duration::from_millis(200));
        cache.set("a", 1);

        assert_eq!(cache.get(&"a"), Some(1));

        std::thread::sleep(Duration::from_millis(400));
        assert_eq!(cache.get(&"a"), None);
        assert!(!cache.has(&"a"));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = BoundedCache::new(3, TTL);
        for key in 1..=4 {
            cache.set(key, key * 10);
        }

        assert_eq!(cache.len(), 3);
        assert!(!cache.has(&1));
        assert!(cache.has(&2));
        assert!(cache.has(&4));
    }

    #[test]
    fn test_read_refreshes_recency() {
        let cache = BoundedCache::new(3, TTL);
        for key in 1..=3 {
            cache.set(key, key);
        }
        cache.len();
        assert_eq!(cache.get(&1), Some(1));

        cache.set(4, 4);

        assert_eq!(cache.len(), 3);
        assert!(cache.has(&1));
        assert!(!cache.has(&2));
    }

    #[test]
    fn test_overwrite_keeps_one_entry() {
        let cache = BoundedCache::new(2, TTL);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), Some(10));
        assert_eq!(cache.get(&"b"), Some(2));
    }

    #[test]
    fn test_zero_ttl_or_capacity_disables_cache() {
        for cache in [BoundedCache::new(10, Duration::ZERO), BoundedCache::new(0, TTL)] {
            cache.set("a", 1);

            assert!(!cache.is_enabled());
            assert_eq!(cache.get(&"a"), None);
            assert!(cache.is_empty());
        }
    }

    #[test]
    fn test_clear() {
        let cache = BoundedCache::new(10, TTL);
        cache.set("a", 1);
        cache.set("b", 2);

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a"), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_access() {
        let cache = Arc::new(BoundedCache::new(50, TTL));
        let mut handles = Vec::new();

        for task in 0..8u32 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..200u32 {
                    cache.set(i % 80, task);
                    let _ = cache.get(&(i % 80));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(cache.len() <= 50);
    }
}
