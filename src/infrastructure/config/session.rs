//! Session lifetime and readiness strategy configuration.

use std::time::Duration;

use serde::Deserialize;

/// Session TTL and registry sweep settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    /// Idle TTL applied when a request does not name one (seconds).
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u64,
    /// Upper bound between registry expiry sweeps (seconds).
    #[serde(default = "default_expiration_interval_secs")]
    pub expiration_interval_secs: u64,
}

fn default_duration_secs() -> u64 {
    300 // 5 minutes
}

fn default_expiration_interval_secs() -> u64 {
    20
}

impl SessionsConfig {
    #[must_use]
    pub fn default_duration(&self) -> Duration {
        Duration::from_secs(self.default_duration_secs)
    }

    #[must_use]
    pub fn expiration_interval(&self) -> Duration {
        Duration::from_secs(self.expiration_interval_secs)
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: default_duration_secs(),
            expiration_interval_secs: default_expiration_interval_secs(),
        }
    }
}

/// How callers wait for readiness.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    /// Interval between readiness re-checks (milliseconds).
    #[serde(default = "default_ready_poll_interval_ms")]
    pub ready_poll_interval_ms: u64,
    /// Default timeout for a blocking readiness wait (seconds).
    #[serde(default = "default_blocking_timeout_secs")]
    pub blocking_timeout_secs: u64,
}

fn default_ready_poll_interval_ms() -> u64 {
    5000
}

fn default_blocking_timeout_secs() -> u64 {
    60
}

impl StrategyConfig {
    #[must_use]
    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_poll_interval_ms)
    }

    #[must_use]
    pub fn blocking_timeout(&self) -> Duration {
        Duration::from_secs(self.blocking_timeout_secs)
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            ready_poll_interval_ms: default_ready_poll_interval_ms(),
            blocking_timeout_secs: default_blocking_timeout_secs(),
        }
    }
}
