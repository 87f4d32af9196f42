//! Resilient execution configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};

/// Retry and queuing defaults applied to every call that does not supply its own
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Whether failed attempts are retried at all
    #[serde(default = "crate::domains::utils::default_true")]
    pub retry: bool,

    /// Total number of attempts for one call (0 behaves like 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit
    #[serde(
        rename = "retry_delay_ms",
        with = "crate::domains::utils::serde_duration_millis",
        default = "default_retry_delay"
    )]
    pub retry_delay: Duration,

    /// Optional upper bound on a single backoff delay (uncapped when unset)
    #[serde(
        rename = "max_delay_ms",
        with = "crate::domains::utils::serde_option_duration_millis",
        default
    )]
    pub max_delay: Option<Duration>,

    /// How the delay grows between attempts
    #[serde(default)]
    pub backoff: BackoffKind,

    /// Growth factor for exponential backoff
    #[serde(default = "default_backoff_base")]
    pub backoff_base: f64,

    /// Whether a call made while offline is queued for replay
    #[serde(default = "crate::domains::utils::default_true")]
    pub offline_queue: bool,
}

/// Backoff curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// `retry_delay * attempt`
    #[default]
    Linear,
    /// `retry_delay` every time
    Fixed,
    /// `retry_delay * backoff_base^(attempt - 1)`
    Exponential,
}

impl BackoffKind {
    pub const CHOICES: [&'static str; 3] = ["linear", "fixed", "exponential"];
}

impl FromStr for BackoffKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(BackoffKind::Linear),
            "fixed" => Ok(BackoffKind::Fixed),
            "exponential" => Ok(BackoffKind::Exponential),
            _ => Err(format!("Invalid backoff: {}", s)),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            retry: true,
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            max_delay: None,
            backoff: BackoffKind::Linear,
            backoff_base: default_backoff_base(),
            offline_queue: true,
        }
    }
}

impl Validatable for ExecutionConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(max_delay) = self.max_delay {
            validate_positive(max_delay.as_millis(), "max_delay_ms", self.domain_name())?;

            if max_delay < self.retry_delay {
                return Err(self.validation_error(format!(
                    "max_delay_ms ({}) must not be below retry_delay_ms ({})",
                    max_delay.as_millis(),
                    self.retry_delay.as_millis()
                )));
            }
        }

        if self.backoff == BackoffKind::Exponential && self.backoff_base < 1.0 {
            return Err(self.validation_error(format!(
                "backoff_base must be at least 1.0, got {}",
                self.backoff_base
            )));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "execution"
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_millis(1000)
}

fn default_backoff_base() -> f64 {
    2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_defaults() {
        let config = ExecutionConfig::default();
        assert!(config.retry);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(1000));
        assert_eq!(config.backoff, BackoffKind::Linear);
        assert_eq!(config.max_delay, None);
        assert!(config.offline_queue);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_retries_is_valid() {
        let config = ExecutionConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_delay_below_unit_rejected() {
        let config = ExecutionConfig {
            retry_delay: Duration::from_secs(5),
            max_delay: Some(Duration::from_secs(1)),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exponential_base_checked() {
        let config = ExecutionConfig {
            backoff: BackoffKind::Exponential,
            backoff_base: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_from_str() {
        assert_eq!("Linear".parse::<BackoffKind>().unwrap(), BackoffKind::Linear);
        assert_eq!("EXPONENTIAL".parse::<BackoffKind>().unwrap(), BackoffKind::Exponential);
        assert!("jitter".parse::<BackoffKind>().is_err());
    }
}
