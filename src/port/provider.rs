//! Provider port for controlling compute instances.
//!
//! One implementation per backend (container runtime, orchestrator service
//! or deployment API, batch scheduler, OS unit manager).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::cancel::CancelToken;
use crate::domain::{InstanceConfig, InstanceInfo, ListOptions};
use crate::error::Result;

/// Group name to ordered member instance names.
pub type GroupMap = HashMap<String, Vec<String>>;

/// Backend capable of starting, stopping and inspecting instances.
///
/// # Implementation Notes
///
/// - `instance_inspect` must be free of side effects.
/// - `instance_start` on a started instance and `instance_stop` on a stopped
///   one must converge without error.
/// - Every call receives a [`CancelToken`]; backends that can abort an
///   in-flight request should watch it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Start (or scale up) the instance.
    async fn instance_start(&self, cancel: &CancelToken, name: &str) -> Result<()>;

    /// Stop (or scale to zero) the instance.
    async fn instance_stop(&self, cancel: &CancelToken, name: &str) -> Result<()>;

    /// Current state of the instance.
    async fn instance_inspect(&self, cancel: &CancelToken, name: &str) -> Result<InstanceInfo>;

    /// Instances visible to this backend.
    async fn instance_list(
        &self,
        cancel: &CancelToken,
        options: ListOptions,
    ) -> Result<Vec<InstanceConfig>>;

    /// Groups discovered from instance metadata.
    async fn instance_groups(&self, cancel: &CancelToken) -> Result<GroupMap>;

    /// Push names of instances that stopped or scaled to zero outside our
    /// control into `stopped` until `cancel` fires or the backend's event
    /// source ends.
    async fn notify_instance_stopped(&self, cancel: &CancelToken, stopped: mpsc::Sender<String>);

    /// Backend name for logging.
    fn provider_name(&self) -> &'static str;
}
