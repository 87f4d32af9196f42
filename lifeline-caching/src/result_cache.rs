//! Process-wide result cache
//!
//! Values of any serializable type share one map keyed by caller-supplied
//! strings. Keys are opaque; namespacing is the caller's business.

use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::{
    cache::Cache, config::ResultCacheConfig, stores::TtlCache, CacheResult, CacheStats,
};

/// Key and lifetime for a cached fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    pub key: String,
    pub ttl: Duration,
}

impl CacheOptions {
    pub fn new(key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            ttl,
        }
    }
}

/// Result cache implementation
pub struct ResultCache {
    inner: TtlCache<String, serde_json::Value>,
    config: ResultCacheConfig,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::from_config(ResultCacheConfig::default())
    }
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new result cache from configuration
    pub fn from_config(config: ResultCacheConfig) -> Self {
        Self {
            inner: TtlCache::new(config.default_ttl),
            config,
        }
    }

    pub fn config(&self) -> &ResultCacheConfig {
        &self.config
    }

    /// Get a live cached value
    ///
    /// Returns `None` when the key is absent, expired (the entry is purged), or
    /// holds a value that does not decode as `T` (the entry is dropped).
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.config.enabled {
            return None;
        }

        let key = key.to_string();
        let value = match self.inner.get(&key).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache lookup for '{}' failed: {}", key, e);
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Cached value for '{}' has an unexpected shape, dropping it: {}", key, e);
                let _ = self.inner.remove(&key).await;
                None
            }
        }
    }

    /// Store a value that expires `ttl` from now, replacing any existing entry
    pub async fn set<T: Serialize>(
        &self,
        key: impl Into<String>,
        value: &T,
        ttl: Duration,
    ) -> CacheResult<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let value = serde_json::to_value(value)?;
        self.inner.put_with_ttl(key.into(), value, ttl).await
    }

    /// Store a value with the configured default TTL
    pub async fn put<T: Serialize>(&self, key: impl Into<String>, value: &T) -> CacheResult<()> {
        self.set(key, value, self.config.default_ttl).await
    }

    /// Remove an entry, returning whether a live value was removed
    pub async fn remove(&self, key: &str) -> bool {
        matches!(self.inner.remove(&key.to_string()).await, Ok(Some(_)))
    }

    /// Remove every entry
    pub async fn clear(&self) {
        if let Err(e) = self.inner.clear().await {
            warn!("Failed to clear result cache: {}", e);
        }
        debug!("Result cache cleared");
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        self.inner.len().await.unwrap_or(0)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop expired entries eagerly
    pub async fn cleanup_expired(&self) -> usize {
        self.inner.cleanup_expired().await.unwrap_or(0)
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.stats().await.unwrap_or_default()
    }

    /// Serve from cache or fetch and populate
    ///
    /// On a hit `fetch` is never invoked. On a miss the fetched value is stored
    /// under `options.key` for `options.ttl`. A failed fetch propagates and
    /// leaves the cache untouched.
    pub async fn with_cache<T, E, F, Fut>(&self, fetch: F, options: &CacheOptions) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(&options.key).await {
            debug!("Cache hit for '{}'", options.key);
            return Ok(cached);
        }

        debug!("Cache miss for '{}', fetching", options.key);
        let value = fetch().await?;

        if let Err(e) = self.set(options.key.clone(), &value, options.ttl).await {
            warn!("Failed to cache result for '{}': {}", options.key, e);
        }

        Ok(value)
    }
}
