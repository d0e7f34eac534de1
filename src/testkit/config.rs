//! Canonical test configurations.
//!
//! Short intervals so polling and refresh tests finish in milliseconds.

use std::time::Duration;

use crate::application::session::SessionConfig;

/// Session config with millisecond-scale intervals.
pub fn session() -> SessionConfig {
    SessionConfig {
        default_duration: Duration::from_secs(60),
        ready_poll_interval: Duration::from_millis(20),
        blocking_timeout: Duration::from_secs(2),
        group_refresh_interval: Duration::from_millis(20),
        provider_timeout: Duration::from_secs(2),
        stop_concurrency: 4,
    }
}

/// Registry sweep resolution for tests.
pub fn expiration_interval() -> Duration {
    Duration::from_millis(10)
}
