//! Session state assembled per request.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::instance::InstanceInfo;
use crate::error::Error;

/// Outcome of one instance's start-or-join attempt.
#[derive(Debug, Clone)]
pub struct InstanceState {
    pub instance: Option<InstanceInfo>,
    pub error: Option<Error>,
}

impl InstanceState {
    #[must_use]
    pub fn from_result(result: crate::error::Result<InstanceInfo>) -> Self {
        match result {
            Ok(info) => Self {
                instance: Some(info),
                error: None,
            },
            Err(err) => Self {
                instance: None,
                error: Some(err),
            },
        }
    }

    /// Ready means the provider reports Ready and no error was recorded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.error.is_none() && self.instance.as_ref().is_some_and(InstanceInfo::is_ready)
    }
}

impl Serialize for InstanceState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("InstanceState", 2)?;
        state.serialize_field("instance", &self.instance)?;
        state.serialize_field("error", &self.error.as_ref().map(ToString::to_string))?;
        state.end()
    }
}

/// Aggregate readiness of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Ready,
    NotReady,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str("ready"),
            Self::NotReady => f.write_str("not-ready"),
        }
    }
}

/// Per-request snapshot mapping each requested name to its outcome.
///
/// Built fresh for every request once all attempts have completed.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    instances: BTreeMap<String, InstanceState>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, state: InstanceState) {
        self.instances.insert(name.into(), state);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&InstanceState> {
        self.instances.get(name)
    }

    pub fn instances(&self) -> impl Iterator<Item = (&String, &InstanceState)> {
        self.instances.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// True iff every member is Ready with no error.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.instances.values().all(InstanceState::is_ready)
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        if self.is_ready() {
            SessionStatus::Ready
        } else {
            SessionStatus::NotReady
        }
    }
}

impl FromIterator<(String, InstanceState)> for SessionState {
    fn from_iter<I: IntoIterator<Item = (String, InstanceState)>>(iter: I) -> Self {
        Self {
            instances: iter.into_iter().collect(),
        }
    }
}

impl Serialize for SessionState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let instances: Vec<&InstanceState> = self.instances.values().collect();
        let mut state = serializer.serialize_struct("SessionState", 2)?;
        state.serialize_field("instances", &instances)?;
        state.serialize_field("status", &self.status())?;
        state.end()
    }
}
