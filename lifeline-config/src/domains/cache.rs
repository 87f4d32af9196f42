//! Caching configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether result caching is enabled
    #[serde(default = "crate::domains::utils::default_true")]
    pub enabled: bool,

    /// TTL used when a caller does not pick one
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_ttl")]
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: default_ttl(),
        }
    }
}

impl Validatable for CacheConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.default_ttl.as_secs(), "default_ttl", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "cache"
    }
}

fn default_ttl() -> Duration {
    Duration::from_secs(300) // 5 minutes
}
