//! Domain-specific configuration modules

pub mod cache;
pub mod connectivity;
pub mod execution;
pub mod logging;
pub mod queue;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Lifeline configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LifelineConfig {
    /// Retry and queuing defaults for the resilient executor
    #[serde(default)]
    pub execution: execution::ExecutionConfig,

    /// Offline queue configuration
    #[serde(default)]
    pub queue: queue::QueueConfig,

    /// Result cache configuration
    #[serde(default)]
    pub cache: cache::CacheConfig,

    /// Reachability probe configuration
    #[serde(default)]
    pub connectivity: connectivity::ConnectivityConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl LifelineConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.execution.validate()?;
        self.queue.validate()?;
        self.cache.validate()?;
        self.connectivity.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = LifelineConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
