//! Instance snapshot types reported by providers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider-reported lifecycle state of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceStatus {
    /// Start was issued but the provider has not yet reported readiness.
    Starting,
    /// The instance can serve traffic.
    Ready,
    /// The instance exists but is not serving traffic yet.
    NotReady,
    /// The instance failed in a way that waiting will not fix.
    Unrecoverable,
}

impl InstanceStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::NotReady => "not-ready",
            Self::Unrecoverable => "unrecoverable",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time snapshot of one instance, as seen by the provider.
///
/// Never treated as authoritative cached state: every readiness decision
/// comes from a fresh inspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    pub name: String,
    pub current_replicas: u32,
    pub desired_replicas: u32,
    pub status: InstanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InstanceInfo {
    /// Snapshot of an instance that is serving traffic.
    pub fn ready(name: impl Into<String>, replicas: u32) -> Self {
        Self {
            name: name.into(),
            current_replicas: replicas,
            desired_replicas: replicas,
            status: InstanceStatus::Ready,
            message: None,
        }
    }

    /// Snapshot of an instance still converging towards `desired` replicas.
    pub fn not_ready(name: impl Into<String>, current: u32, desired: u32) -> Self {
        Self {
            name: name.into(),
            current_replicas: current,
            desired_replicas: desired,
            status: InstanceStatus::NotReady,
            message: None,
        }
    }

    /// Snapshot of an instance that cannot become ready.
    pub fn unrecoverable(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current_replicas: 0,
            desired_replicas: 0,
            status: InstanceStatus::Unrecoverable,
            message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status == InstanceStatus::Ready
    }
}

/// Static description of an instance the provider can manage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub name: String,
    /// Group the instance belongs to, if it declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl InstanceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Filter for listing instances from a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Include instances that are not opted in to scale-to-zero.
    pub all: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&InstanceStatus::NotReady).unwrap();
        assert_eq!(json, "\"not-ready\"");
        assert_eq!(InstanceStatus::NotReady.to_string(), "not-ready");
    }

    #[test]
    fn info_serializes_camel_case_and_omits_empty_message() {
        let info = InstanceInfo::ready("nginx", 1);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["name"], "nginx");
        assert_eq!(json["currentReplicas"], 1);
        assert_eq!(json["desiredReplicas"], 1);
        assert_eq!(json["status"], "ready");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn unrecoverable_carries_message() {
        let info = InstanceInfo::unrecoverable("db", "image pull failed");
        assert!(!info.is_ready());
        assert_eq!(info.message.as_deref(), Some("image pull failed"));
    }
}
