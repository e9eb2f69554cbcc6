use async_trait::async_trait;

pub mod memory;

pub use memory::MemoryCache;

/// Cache statistics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Read-through cache seam; services depend on this so tests can swap in
/// a fake.
#[async_trait]
pub trait Cache: Send + Sync {
    type Key: Send + Sync;
    type Value: Send + Sync;

    async fn get(&self, key: &Self::Key) -> Option<Self::Value>;

    async fn insert(&self, key: Self::Key, value: Self::Value);

    async fn invalidate(&self, key: &Self::Key) -> Option<Self::Value>;

    async fn clear(&self) -> usize;

    async fn stats(&self) -> CacheStats;
}
