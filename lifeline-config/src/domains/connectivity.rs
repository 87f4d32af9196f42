//! Reachability probe configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_http_url, validate_positive, Validatable};

/// Reachability probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// URL requested to decide whether the network is reachable
    #[serde(default = "default_probe_url")]
    pub probe_url: String,

    /// Timeout for one probe request
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_probe_timeout")]
    pub probe_timeout: Duration,

    /// Interval between background probes
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// State assumed before the first probe completes
    #[serde(default = "crate::domains::utils::default_true")]
    pub assume_connected: bool,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_url: default_probe_url(),
            probe_timeout: default_probe_timeout(),
            poll_interval: default_poll_interval(),
            assume_connected: true,
        }
    }
}

impl Validatable for ConnectivityConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_http_url(&self.probe_url, "probe_url", self.domain_name())?;
        validate_positive(self.probe_timeout.as_secs(), "probe_timeout", self.domain_name())?;
        validate_positive(self.poll_interval.as_secs(), "poll_interval", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "connectivity"
    }
}

fn default_probe_url() -> String {
    "https://clients3.google.com/generate_204".to_string()
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(10)
}
