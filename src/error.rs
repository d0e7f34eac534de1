use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Crate-wide error type.
///
/// `Clone` because a single rejected promise is observed by every caller
/// that joined it. Sources that are not `Clone` are held behind an `Arc`.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error(transparent)]
    Config(Arc<ConfigError>),

    #[error("{field} is mandatory")]
    MissingField { field: &'static str },

    #[error("group {group:?} not found, available groups: {available_groups:?}")]
    GroupNotFound {
        group: String,
        available_groups: Vec<String>,
    },

    #[error("group {group:?} has no member instances")]
    EmptyGroup { group: String },

    #[error("provider error for instance {instance:?}: {message}")]
    Provider { instance: String, message: String },

    #[error("timeout after {duration:?}")]
    Timeout { duration: Duration },

    #[error("request cancelled: {cause}")]
    Cancelled { cause: String },

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("executor returned without settling the promise")]
    Unsettled,

    #[error("store error: {0}")]
    Store(String),

    #[error("JSON error: {0}")]
    Json(Arc<serde_json::Error>),

    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a provider failure attached to one instance.
    pub fn provider(instance: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Provider {
            instance: instance.into(),
            message: message.to_string(),
        }
    }

    /// True for [`Error::Timeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// True for [`Error::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(Arc::new(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}
