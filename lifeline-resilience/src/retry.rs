//! Retry policy for resilient execution

use lifeline_core::AppError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backoff::{BackoffCalculator, BackoffStrategy};

/// Per-call execution policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Whether failed attempts are retried at all
    pub retry: bool,

    /// Attempt bound for one call
    pub max_retries: u32,

    /// Backoff unit
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Optional cap on a single delay; delays grow without bound when unset
    #[serde(default, with = "humantime_serde")]
    pub max_delay: Option<Duration>,

    /// Backoff strategy
    pub backoff: BackoffStrategy,

    /// Queue the action for replay when the call finds the device offline
    pub offline_queue: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            retry: true,
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            max_delay: None,
            backoff: BackoffStrategy::Linear,
            offline_queue: true,
        }
    }
}

impl From<&lifeline_config::ExecutionConfig> for ExecutionConfig {
    fn from(config: &lifeline_config::ExecutionConfig) -> Self {
        Self {
            retry: config.retry,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            max_delay: config.max_delay,
            backoff: BackoffStrategy::from_kind(config.backoff, config.backoff_base),
            offline_queue: config.offline_queue,
        }
    }
}

impl ExecutionConfig {
    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            retry: false,
            ..Default::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_offline_queue(mut self, offline_queue: bool) -> Self {
        self.offline_queue = offline_queue;
        self
    }

    /// Whether another attempt is allowed after `attempts` failures
    pub fn should_retry(&self, attempts: u32) -> bool {
        self.retry && attempts < self.max_retries
    }

    /// Calculate delay for a specific attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        BackoffCalculator::new(self.backoff, self.retry_delay)
            .with_max_delay(self.max_delay)
            .calculate_delay(attempt)
    }
}

/// Trait for errors that can be retried
pub trait Retryable {
    /// Whether this error is retryable
    fn is_retryable(&self) -> bool;
}

impl Retryable for AppError {
    fn is_retryable(&self) -> bool {
        AppError::is_retryable(self)
    }
}

impl Retryable for anyhow::Error {
    fn is_retryable(&self) -> bool {
        AppError::classify(self).is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use lifeline_config::BackoffKind;

    #[test]
    fn test_default_policy_is_linear() {
        let config = ExecutionConfig::default();

        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(3000));
    }

    #[test]
    fn test_long_delays_are_not_truncated() {
        let config = ExecutionConfig::default().with_retry_delay(Duration::from_secs(60));
        assert_eq!(config.max_delay, None);
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(120));

        let capped = config.with_max_delay(Duration::from_secs(90));
        assert_eq!(capped.delay_for_attempt(2), Duration::from_secs(90));
    }

    #[test]
    fn test_should_retry() {
        let config = ExecutionConfig::default();
        assert!(config.should_retry(1));
        assert!(config.should_retry(2));
        assert!(!config.should_retry(3));

        assert!(!ExecutionConfig::no_retry().should_retry(1));
        assert!(!ExecutionConfig::default().with_max_retries(0).should_retry(1));
    }

    #[test]
    fn test_from_file_config() {
        let file_config = lifeline_config::ExecutionConfig {
            max_retries: 5,
            retry_delay: Duration::from_millis(10),
            backoff: BackoffKind::Exponential,
            backoff_base: 3.0,
            offline_queue: false,
            ..Default::default()
        };

        let config = ExecutionConfig::from(&file_config);
        assert_eq!(config.max_retries, 5);
        assert!(!config.offline_queue);
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(90));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::network("down").is_retryable());
        assert!(!Retryable::is_retryable(&AppError::authentication("expired")));

        let wrapped = anyhow::Error::new(AppError::authentication("expired")).context("loading feed");
        assert!(!Retryable::is_retryable(&wrapped));
        assert!(Retryable::is_retryable(&anyhow!("socket closed")));
    }
}
