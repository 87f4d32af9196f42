//! Core cache traits and types

use async_trait::async_trait;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

use crate::{CacheResult, CacheStats};

/// Trait for types that can be used as cache keys
pub trait CacheKey: Clone + Eq + Hash + Debug + Send + Sync {}

/// Trait for types that can be cached
pub trait CacheValue: Clone + Debug + Send + Sync {}

// Blanket implementations
impl<T> CacheKey for T where T: Clone + Eq + Hash + Debug + Send + Sync {}
impl<T> CacheValue for T where T: Clone + Debug + Send + Sync {}

/// Core cache trait
#[async_trait]
pub trait Cache<K: CacheKey + 'static, V: CacheValue + 'static>: Send + Sync {
    /// Get a value from the cache
    async fn get(&self, key: &K) -> CacheResult<Option<V>>;

    /// Put a value into the cache
    async fn put(&self, key: K, value: V) -> CacheResult<()>;

    /// Put a value with TTL
    async fn put_with_ttl(&self, key: K, value: V, _ttl: Duration) -> CacheResult<()> {
        // Default implementation ignores TTL
        self.put(key, value).await
    }

    /// Remove a value from the cache
    async fn remove(&self, key: &K) -> CacheResult<Option<V>>;

    /// Check if a key exists
    async fn contains_key(&self, key: &K) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Clear all entries
    async fn clear(&self) -> CacheResult<()>;

    /// Get the number of entries
    async fn len(&self) -> CacheResult<usize>;

    /// Check if cache is empty
    async fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get cache statistics
    async fn stats(&self) -> CacheResult<CacheStats>;
}

/// Cache entry with metadata
///
/// Timestamps use tokio's clock so paused-time tests can move expiry forward.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,

    /// When the entry was created
    pub created_at: Instant,

    /// When the entry expires (if applicable)
    pub expires_at: Option<Instant>,
}

impl<V: CacheValue> CacheEntry<V> {
    /// Create a new cache entry
    pub fn new(value: V) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            expires_at: None,
        }
    }

    /// Create a new cache entry with TTL
    pub fn with_ttl(value: V, ttl: Duration) -> Self {
        let mut entry = Self::new(value);
        entry.expires_at = Some(entry.created_at + ttl);
        entry
    }

    /// Check if the entry is expired
    ///
    /// An entry is live strictly before its expiry instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Check expiry against a given instant
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_exactly_at_deadline() {
        let entry = CacheEntry::with_ttl("v", Duration::from_secs(10));
        assert!(!entry.is_expired());

        tokio::time::advance(Duration::from_millis(9_999)).await;
        assert!(!entry.is_expired());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_without_ttl_never_expires() {
        let entry = CacheEntry::new(1_u32);
        tokio::time::advance(Duration::from_secs(86_400)).await;
        assert!(!entry.is_expired());
        assert_eq!(entry.expires_at, None);
    }
}
