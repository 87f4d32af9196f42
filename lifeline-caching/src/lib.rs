//! Caching abstractions and implementations for Lifeline
//!
//! This crate provides a generic cache trait, a TTL store, and the
//! process-wide [`ResultCache`] used to short-circuit repeated fetches.

pub mod cache;
pub mod config;
pub mod errors;
pub mod result_cache;
pub mod stats;
pub mod stores;

// Re-export main types
pub use cache::{Cache, CacheEntry, CacheKey, CacheValue};
pub use config::ResultCacheConfig;
pub use errors::{CacheError, CacheResult};
pub use result_cache::{CacheOptions, ResultCache};
pub use stats::CacheStats;
pub use stores::TtlCache;

