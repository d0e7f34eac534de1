//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings. Every
//! section is optional; an empty file yields the defaults.
//!
//! # Example
//!
//! ```no_run
//! use dormant::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("dormant.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::provider::{ProviderConfig, StorageConfig};
use super::session::{SessionsConfig, StrategyConfig};
use crate::application::session::SessionConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Session TTL and registry sweep settings.
    #[serde(default)]
    pub sessions: SessionsConfig,

    /// Readiness wait settings.
    #[serde(default)]
    pub strategy: StrategyConfig,

    /// Provider call settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Optional session persistence.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Reject zero intervals, timeouts and concurrency.
    fn validate(&self) -> Result<()> {
        let positive: [(&'static str, u64); 6] = [
            ("default_duration_secs", self.sessions.default_duration_secs),
            (
                "expiration_interval_secs",
                self.sessions.expiration_interval_secs,
            ),
            ("ready_poll_interval_ms", self.strategy.ready_poll_interval_ms),
            ("blocking_timeout_secs", self.strategy.blocking_timeout_secs),
            ("timeout_secs", self.provider.timeout_secs),
            (
                "group_refresh_interval_ms",
                self.provider.group_refresh_interval_ms,
            ),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
        }

        if self.provider.stop_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "stop_concurrency",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if !self.logging.is_known_format() {
            return Err(ConfigError::InvalidValue {
                field: "format",
                reason: format!("expected \"pretty\" or \"json\", got {:?}", self.logging.format),
            }
            .into());
        }
        if self
            .storage
            .file
            .as_ref()
            .is_some_and(|file| file.as_os_str().is_empty())
        {
            return Err(ConfigError::MissingField { field: "file" }.into());
        }
        Ok(())
    }

    /// Session manager tunables derived from this configuration.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            default_duration: self.sessions.default_duration(),
            ready_poll_interval: self.strategy.ready_poll_interval(),
            blocking_timeout: self.strategy.blocking_timeout(),
            group_refresh_interval: self.provider.group_refresh_interval(),
            provider_timeout: self.provider.timeout(),
            stop_concurrency: self.provider.stop_concurrency,
        }
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
