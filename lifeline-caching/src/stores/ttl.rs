//! Time-based TTL cache implementation

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::{
    cache::{Cache, CacheEntry, CacheKey, CacheValue},
    stats::{create_stats_collector, SharedStatsCollector},
    CacheResult, CacheStats,
};

/// TTL-based cache implementation
///
/// Expiry is enforced on read: a stale entry is removed by the first `get`
/// that observes it. `cleanup_expired` only reclaims memory early.
pub struct TtlCache<K, V> {
    /// Default TTL for entries
    default_ttl: Duration,

    /// Store with entries
    store: Arc<RwLock<HashMap<K, CacheEntry<V>>>>,

    /// Statistics collector
    stats: SharedStatsCollector,
}

impl<K: CacheKey + 'static, V: CacheValue + 'static> TtlCache<K, V> {
    /// Create a new TTL cache with default TTL
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            store: Arc::new(RwLock::new(HashMap::new())),
            stats: create_stats_collector(),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Number of stored entries, expired or not
    pub fn raw_len(&self) -> usize {
        self.store.read().len()
    }

    /// Clean up expired entries
    pub async fn cleanup_expired(&self) -> CacheResult<usize> {
        let mut store = self.store.write();
        let now = Instant::now();

        let before = store.len();
        store.retain(|_, entry| !entry.is_expired_at(now));
        let count = before - store.len();

        self.stats.record_evictions(count as u64);
        Ok(count)
    }
}

#[async_trait]
impl<K: CacheKey + 'static, V: CacheValue + 'static> Cache<K, V> for TtlCache<K, V> {
    async fn get(&self, key: &K) -> CacheResult<Option<V>> {
        let mut store = self.store.write();
        let now = Instant::now();

        let result = match store.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                store.remove(key);
                self.stats.record_evictions(1);
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        };

        Ok(result)
    }

    async fn put(&self, key: K, value: V) -> CacheResult<()> {
        self.put_with_ttl(key, value, self.default_ttl).await
    }

    async fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> CacheResult<()> {
        let mut store = self.store.write();
        store.insert(key, CacheEntry::with_ttl(value, ttl));
        self.stats.record_put();
        Ok(())
    }

    async fn remove(&self, key: &K) -> CacheResult<Option<V>> {
        let mut store = self.store.write();
        match store.remove(key) {
            Some(entry) if entry.is_expired() => {
                self.stats.record_evictions(1);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut store = self.store.write();
        let count = store.len();
        store.clear();
        self.stats.record_evictions(count as u64);
        Ok(())
    }

    async fn len(&self) -> CacheResult<usize> {
        let store = self.store.read();
        let now = Instant::now();

        // Count non-expired entries
        Ok(store.values().filter(|entry| !entry.is_expired_at(now)).count())
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        let len = self.len().await?;
        Ok(self.stats.get_stats(len))
    }
}
