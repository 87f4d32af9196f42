//! Offline queue configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};

/// Offline queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// A queued action that fails replay after this age is dropped
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_max_age")]
    pub max_age: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_age: default_max_age(),
        }
    }
}

impl Validatable for QueueConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_age.as_secs(), "max_age", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "queue"
    }
}

fn default_max_age() -> Duration {
    Duration::from_secs(24 * 60 * 60) // 24 hours
}
