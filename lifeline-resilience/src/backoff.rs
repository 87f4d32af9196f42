//! Backoff strategies for retry policies

use lifeline_config::BackoffKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff strategy for retries
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed,

    /// Linear increase: delay = initial_delay * attempt
    #[default]
    Linear,

    /// Exponential increase: delay = initial_delay * base^(attempt-1)
    Exponential {
        /// Base for exponential calculation (e.g., 2.0 for doubling)
        base: f64,
    },
}

impl BackoffStrategy {
    /// Strategy described by the configuration file's `backoff` / `backoff_base` pair
    pub fn from_kind(kind: BackoffKind, base: f64) -> Self {
        match kind {
            BackoffKind::Fixed => BackoffStrategy::Fixed,
            BackoffKind::Linear => BackoffStrategy::Linear,
            BackoffKind::Exponential => BackoffStrategy::Exponential { base },
        }
    }
}

/// Backoff delay calculator
///
/// Delays are uncapped unless a maximum is set.
#[derive(Debug, Clone)]
pub struct BackoffCalculator {
    strategy: BackoffStrategy,
    initial_delay: Duration,
    max_delay: Option<Duration>,
}

impl BackoffCalculator {
    /// Create a new backoff calculator
    pub fn new(strategy: BackoffStrategy, initial_delay: Duration) -> Self {
        Self {
            strategy,
            initial_delay,
            max_delay: None,
        }
    }

    /// Cap every delay at `max_delay`
    pub fn with_max_delay(mut self, max_delay: Option<Duration>) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Calculate delay for a specific attempt (1-indexed)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay = self.calculate_base_delay(attempt);
        match self.max_delay {
            Some(max_delay) => delay.min(max_delay),
            None => delay,
        }
    }

    fn calculate_base_delay(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::Fixed => self.initial_delay,

            BackoffStrategy::Linear => self.initial_delay.saturating_mul(attempt),

            BackoffStrategy::Exponential { base } => {
                if attempt == 0 {
                    return Duration::ZERO;
                }
                let multiplier = base.powi(attempt as i32 - 1);
                let nanos = self.initial_delay.as_nanos() as f64 * multiplier;
                if !nanos.is_finite() || nanos >= u64::MAX as f64 {
                    return self.max_delay.unwrap_or(Duration::MAX);
                }
                Duration::from_nanos(nanos as u64)
            }
        }
    }
}
