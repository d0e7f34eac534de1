//! Provider call and persistence configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Provider call settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Stop every untracked instance when the runtime starts.
    #[serde(default = "default_auto_stop_on_startup")]
    pub auto_stop_on_startup: bool,
    /// Upper bound on a single provider call (seconds).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Interval between group table refreshes (milliseconds).
    #[serde(default = "default_group_refresh_interval_ms")]
    pub group_refresh_interval_ms: u64,
    /// Concurrent stops during startup reconciliation.
    #[serde(default = "default_stop_concurrency")]
    pub stop_concurrency: usize,
}

fn default_auto_stop_on_startup() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_group_refresh_interval_ms() -> u64 {
    2000
}

fn default_stop_concurrency() -> usize {
    10
}

impl ProviderConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn group_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.group_refresh_interval_ms)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            auto_stop_on_startup: default_auto_stop_on_startup(),
            timeout_secs: default_timeout_secs(),
            group_refresh_interval_ms: default_group_refresh_interval_ms(),
            stop_concurrency: default_stop_concurrency(),
        }
    }
}

/// Session persistence across restarts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding tracked sessions. Persistence is off when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}
