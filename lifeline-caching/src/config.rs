//! Cache configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{CacheError, CacheResult};

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultCacheConfig {
    /// When disabled every lookup misses and nothing is stored
    pub enabled: bool,

    /// TTL used by [`crate::ResultCache::put`] when none is given
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,
}

impl Default for ResultCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: Duration::from_secs(300),
        }
    }
}

impl ResultCacheConfig {
    pub fn validate(&self) -> CacheResult<()> {
        if self.default_ttl.is_zero() {
            return Err(CacheError::InvalidConfiguration(
                "default_ttl must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ResultCacheConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = ResultCacheConfig {
            enabled: true,
            default_ttl: Duration::ZERO,
        };
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfiguration(_))
        ));
    }
}
