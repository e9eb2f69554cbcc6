use crate::{Cache, CacheStats};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, trace};

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

#[derive(Default)]
struct Counters {
    hits: u64,
    misses: u64,
    expirations: u64,
}

struct Inner<K: std::hash::Hash + Eq, V> {
    entries: LruCache<K, Entry<V>>,
    counters: Counters,
}

/// LRU cache whose entries expire `ttl` after insertion.
///
/// Holds the short-lived copy of a fetched collection; a stale read misses
/// and the caller re-fetches, so expiry never serves outdated data.
pub struct MemoryCache<K: std::hash::Hash + Eq, V> {
    inner: Mutex<Inner<K, V>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V> MemoryCache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Capacity must be non-zero.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        debug!(capacity, ttl_secs = ttl.as_secs(), "creating memory cache");
        let size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(size),
                counters: Counters::default(),
            }),
            ttl,
            capacity: size.get(),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        enum Lookup<V> {
            Hit(V),
            Expired,
            Miss,
        }

        let mut inner = self.inner.lock().await;
        let lookup = match inner.entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() <= self.ttl => {
                Lookup::Hit(entry.value.clone())
            }
            Some(_) => Lookup::Expired,
            None => Lookup::Miss,
        };

        match lookup {
            Lookup::Hit(value) => {
                trace!("cache hit");
                inner.counters.hits += 1;
                Some(value)
            }
            Lookup::Expired => {
                trace!("cache entry expired");
                inner.entries.pop(key);
                inner.counters.expirations += 1;
                inner.counters.misses += 1;
                None
            }
            Lookup::Miss => {
                trace!("cache miss");
                inner.counters.misses += 1;
                None
            }
        }
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.lock().await;
        inner.entries.put(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop one entry, returning the value it held.
    pub async fn invalidate(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().await;
        inner.entries.pop(key).map(|entry| entry.value)
    }

    pub async fn clear(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let count = inner.entries.len();
        inner.entries.clear();
        debug!(count, "cleared memory cache");
        count
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        CacheStats {
            hits: inner.counters.hits,
            misses: inner.counters.misses,
            expirations: inner.counters.expirations,
            size: inner.entries.len(),
            capacity: self.capacity,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[async_trait]
impl<K, V> Cache for MemoryCache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
{
    type Key = K;
    type Value = V;

    async fn get(&self, key: &K) -> Option<V> {
        MemoryCache::get(self, key).await
    }

    async fn insert(&self, key: K, value: V) {
        MemoryCache::insert(self, key, value).await;
    }

    async fn invalidate(&self, key: &K) -> Option<V> {
        MemoryCache::invalidate(self, key).await
    }

    async fn clear(&self) -> usize {
        MemoryCache::clear(self).await
    }

    async fn stats(&self) -> CacheStats {
        MemoryCache::stats(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn basic_insert_get_invalidate() {
        let cache = MemoryCache::new(4, Duration::from_secs(60));

        cache.insert("a", 1).await;
        assert_eq!(cache.get(&"a").await, Some(1));
        assert_eq!(cache.invalidate(&"a").await, Some(1));
        assert_eq!(cache.get(&"a").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new(4, Duration::from_millis(50));

        cache.insert("a", 1).await;
        assert_eq!(cache.get(&"a").await, Some(1));

        sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get(&"a").await, None);

        let stats = cache.stats().await;
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.size, 0);
    }

    #[tokio::test]
    async fn least_recently_used_entry_is_evicted() {
        let cache = MemoryCache::new(2, Duration::from_secs(60));

        cache.insert("a", 1).await;
        cache.insert("b", 2).await;
        cache.get(&"a").await;
        cache.insert("c", 3).await;

        assert_eq!(cache.get(&"b").await, None);
        assert_eq!(cache.get(&"a").await, Some(1));
        assert_eq!(cache.get(&"c").await, Some(3));
    }

    #[tokio::test]
    async fn stats_track_hits_and_misses() {
        let cache = MemoryCache::new(4, Duration::from_secs(60));

        cache.insert("a", 1).await;
        cache.get(&"a").await;
        cache.get(&"a").await;
        cache.get(&"b").await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn clear_reports_dropped_entries() {
        let cache = MemoryCache::new(4, Duration::from_secs(60));

        cache.insert("a", 1).await;
        cache.insert("b", 2).await;
        assert_eq!(cache.clear().await, 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn zero_capacity_clamps_to_one() {
        let cache = MemoryCache::new(0, Duration::from_secs(60));
        cache.insert("a", 1).await;
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.get(&"a").await, Some(1));
    }

    #[tokio::test]
    async fn concurrent_access() {
        let cache = std::sync::Arc::new(MemoryCache::new(16, Duration::from_secs(60)));
        let mut handles = Vec::new();

        for i in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.insert(i, i * 10).await;
                assert_eq!(cache.get(&i).await, Some(i * 10));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len().await, 8);
    }
}
