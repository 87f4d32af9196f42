//! Configuration loading and environment variable handling

use crate::domains::execution::BackoffKind;
use crate::domains::LifelineConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::validation::validate_enum_choice;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "LIFELINE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML (or `.json`) file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<LifelineConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let mut config: LifelineConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<LifelineConfig> {
        let mut config = LifelineConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<LifelineConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut LifelineConfig) -> ConfigResult<()> {
        self.apply_execution_overrides(&mut config.execution)?;
        self.apply_queue_overrides(&mut config.queue)?;
        self.apply_cache_overrides(&mut config.cache)?;
        self.apply_connectivity_overrides(&mut config.connectivity)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    /// Apply execution config overrides
    fn apply_execution_overrides(
        &self,
        config: &mut crate::domains::execution::ExecutionConfig,
    ) -> ConfigResult<()> {
        if let Some(retry) = self.parse_env_var::<bool>("RETRY")? {
            config.retry = retry;
        }

        if let Some(max_retries) = self.parse_env_var::<u32>("MAX_RETRIES")? {
            config.max_retries = max_retries;
        }

        if let Some(delay_ms) = self.parse_env_var::<u64>("RETRY_DELAY_MS")? {
            config.retry_delay = Duration::from_millis(delay_ms);
        }

        if let Ok(backoff) = self.get_env_var("BACKOFF") {
            validate_enum_choice(&backoff, &BackoffKind::CHOICES, "BACKOFF", "env")
                .map_err(|e| ConfigError::EnvError(e.to_string()))?;
            config.backoff = BackoffKind::from_str(&backoff).map_err(ConfigError::EnvError)?;
        }

        if let Some(offline_queue) = self.parse_env_var::<bool>("OFFLINE_QUEUE")? {
            config.offline_queue = offline_queue;
        }

        Ok(())
    }

    /// Apply queue config overrides
    fn apply_queue_overrides(
        &self,
        config: &mut crate::domains::queue::QueueConfig,
    ) -> ConfigResult<()> {
        if let Some(seconds) = self.parse_env_var::<u64>("QUEUE_MAX_AGE")? {
            config.max_age = Duration::from_secs(seconds);
        }
        Ok(())
    }

    /// Apply cache config overrides
    fn apply_cache_overrides(
        &self,
        config: &mut crate::domains::cache::CacheConfig,
    ) -> ConfigResult<()> {
        if let Some(enabled) = self.parse_env_var::<bool>("CACHE_ENABLED")? {
            config.enabled = enabled;
        }

        if let Some(seconds) = self.parse_env_var::<u64>("CACHE_TTL")? {
            config.default_ttl = Duration::from_secs(seconds);
        }

        Ok(())
    }

    /// Apply connectivity config overrides
    fn apply_connectivity_overrides(
        &self,
        config: &mut crate::domains::connectivity::ConnectivityConfig,
    ) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("PROBE_URL") {
            config.probe_url = url;
        }

        if let Some(seconds) = self.parse_env_var::<u64>("PROBE_TIMEOUT")? {
            config.probe_timeout = Duration::from_secs(seconds);
        }

        if let Some(seconds) = self.parse_env_var::<u64>("POLL_INTERVAL")? {
            config.poll_interval = Duration::from_secs(seconds);
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Parse an optional prefixed environment variable
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw.trim().parse().map(Some).map_err(|e: T::Err| {
                ConfigError::EnvError(format!("Invalid {}_{}: {}", self.prefix, name, e))
            }),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
