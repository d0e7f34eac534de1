//! Session orchestration.
//!
//! The [`SessionManager`] sits between callers asking "is X ready?" and a
//! [`Provider`] that can start, stop and inspect instances.
//!
//! # Architecture
//!
//! ```text
//! request ──► in-flight table ──► Promise<InstanceInfo> ──► Provider
//!                  │                     │
//!                  │                     └── put(name, info, ttl) ──► Store
//!                  │                                                   │
//!                  └────────────── remove(name) ◄── expiry hook ◄──────┘
//!                                         └──► Provider::instance_stop
//! ```
//!
//! - At most one Pending promise exists per instance name; concurrent
//!   requests join it instead of issuing a second start.
//! - Store expiry is the only trigger for idle shutdown.
//! - Provider calls run inside promise executors or background tasks, never
//!   while a lock is held.
//!
//! Background tasks (spawned by [`SessionManager::start`]):
//! - **Group watcher**: refreshes the group table on a fixed interval
//! - **Stopped-instance consumer**: forgets sessions whose instance was
//!   stopped outside our control

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::cancel::CancelToken;
use crate::application::promise::Promise;
use crate::domain::InstanceInfo;
use crate::error::{Error, Result};
use crate::port::{ExpireHook, GroupMap, Provider, Store};

mod events;
mod group;
mod ready;
mod reconcile;
mod request;

/// Tunables for the session manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session TTL used when a request passes a zero duration.
    pub default_duration: Duration,
    /// Interval between readiness re-checks while a caller waits.
    pub ready_poll_interval: Duration,
    /// Readiness wait used when a request passes a zero timeout.
    pub blocking_timeout: Duration,
    /// Interval between group table refreshes.
    pub group_refresh_interval: Duration,
    /// Upper bound on any single provider call.
    pub provider_timeout: Duration,
    /// Maximum concurrent stops during reconciliation.
    pub stop_concurrency: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_duration: Duration::from_secs(300),
            ready_poll_interval: Duration::from_secs(5),
            blocking_timeout: Duration::from_secs(60),
            group_refresh_interval: Duration::from_secs(2),
            provider_timeout: Duration::from_secs(60),
            stop_concurrency: 10,
        }
    }
}

type PromiseTable = Arc<Mutex<HashMap<String, Promise<InstanceInfo>>>>;

/// Deduplicates starts, tracks idle TTLs and answers readiness requests.
pub struct SessionManager {
    provider: Arc<dyn Provider>,
    store: Arc<dyn Store>,
    config: SessionConfig,
    promises: PromiseTable,
    /// Replaced wholesale on refresh, never mutated in place.
    groups: RwLock<Arc<GroupMap>>,
    /// Lifetime token: background tasks and promise executors stop on it.
    shutdown: CancelToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionManager {
    /// Create a manager and register its expiry hook with `store`.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the expiry hook.
    pub fn new(
        provider: Arc<dyn Provider>,
        store: Arc<dyn Store>,
        config: SessionConfig,
    ) -> Result<Arc<Self>> {
        let promises: PromiseTable = Arc::new(Mutex::new(HashMap::new()));
        let shutdown = CancelToken::new();

        store.on_expire(expiry_hook(
            Arc::clone(&provider),
            Arc::clone(&promises),
            shutdown.clone(),
            config.provider_timeout,
        ))?;

        Ok(Arc::new(Self {
            provider,
            store,
            config,
            promises,
            groups: RwLock::new(Arc::new(GroupMap::new())),
            shutdown,
            tasks: Mutex::new(Vec::new()),
        }))
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Spawn the group watcher and the stopped-instance consumer.
    pub fn start(self: &Arc<Self>) {
        let watcher = tokio::spawn(Arc::clone(self).watch_groups());
        let consumer = tokio::spawn(Arc::clone(self).consume_stopped_instances());
        self.tasks.lock().extend([watcher, consumer]);
        info!(
            provider = self.provider.provider_name(),
            "Session manager started"
        );
    }

    /// Cancel background tasks and in-flight provider calls, then wait for
    /// the background tasks to exit.
    pub async fn shutdown(&self) {
        self.shutdown.cancel("session manager shutting down");
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            let _ = task.await;
        }
        info!("Session manager stopped");
    }

    /// Forget `name`: drop its in-flight promise and its store entry.
    ///
    /// The instance itself is left as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails.
    pub async fn remove_instance(&self, name: &str) -> Result<()> {
        self.promises.lock().remove(name);
        self.store.delete(name).await
    }
}

/// Store hook: drop the in-flight entry and stop the instance.
///
/// A failed stop is logged and not retried. An expiry racing a new attempt
/// for the same name is skipped; that attempt tracks a fresh session.
fn expiry_hook(
    provider: Arc<dyn Provider>,
    promises: PromiseTable,
    cancel: CancelToken,
    timeout: Duration,
) -> ExpireHook {
    let runtime = Handle::current();
    Arc::new(move |name: String| {
        {
            let mut promises = promises.lock();
            if promises.get(&name).is_some_and(Promise::is_pending) {
                debug!(instance = %name, "Session expired during a new attempt, not stopping");
                return;
            }
            promises.remove(&name);
        }
        let provider = Arc::clone(&provider);
        let cancel = cancel.clone();
        runtime.spawn(async move {
            info!(instance = %name, "Session expired, stopping instance");
            match bounded(&cancel, timeout, provider.instance_stop(&cancel, &name)).await {
                Ok(()) => info!(instance = %name, "Instance stopped"),
                Err(err) => warn!(instance = %name, error = %err, "Failed to stop expired instance"),
            }
        });
    })
}

/// Run `call` under `limit` and `cancel`, whichever ends first.
pub(crate) async fn bounded<T, F>(cancel: &CancelToken, limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        outcome = tokio::time::timeout(limit, call) => {
            outcome.unwrap_or(Err(Error::Timeout { duration: limit }))
        }
        cause = cancel.cancelled() => Err(Error::Cancelled { cause }),
    }
}
