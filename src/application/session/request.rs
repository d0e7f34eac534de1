//! Start-or-join per instance and session assembly.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use super::{bounded, SessionManager};
use crate::application::promise::{Promise, PromiseStatus};
use crate::domain::{InstanceInfo, InstanceState, SessionState};
use crate::error::{Error, Result};

/// What to do for a name, decided under the table lock.
enum Decision {
    /// Pending attempt exists, or a fresh one was just registered.
    Join(Promise<InstanceInfo>),
    /// Fulfilled and ready: slide the TTL, then hand it back.
    Refresh(Promise<InstanceInfo>),
}

impl SessionManager {
    /// Start-or-join the attempt for `name`.
    ///
    /// - Pending promise: returned as is, no second start.
    /// - Fulfilled and Ready: TTL refreshed, same promise returned. If the
    ///   session already expired in the store, a new start attempt replaces
    ///   it instead.
    /// - Fulfilled but not Ready: replaced by an inspect-only attempt.
    /// - Absent or Rejected: replaced by a start attempt.
    pub async fn request_instance(&self, name: &str, duration: Duration) -> Promise<InstanceInfo> {
        let decision = {
            let mut promises = self.promises.lock();
            let existing = promises.get(name).map(|p| (p.status(), p.clone()));
            match existing {
                Some((PromiseStatus::Pending, promise)) => {
                    debug!(instance = %name, "Joining in-flight attempt");
                    Decision::Join(promise)
                }
                Some((PromiseStatus::Fulfilled, promise)) => match promise.peek() {
                    Some(Ok(info)) if info.is_ready() => Decision::Refresh(promise),
                    _ => {
                        let promise = self.spawn_attempt(name, duration, false);
                        promises.insert(name.to_string(), promise.clone());
                        Decision::Join(promise)
                    }
                },
                Some((PromiseStatus::Rejected, _)) | None => {
                    let promise = self.spawn_attempt(name, duration, true);
                    promises.insert(name.to_string(), promise.clone());
                    Decision::Join(promise)
                }
            }
        };

        match decision {
            Decision::Join(promise) => promise,
            Decision::Refresh(promise) => match self.store.touch(name, duration).await {
                Ok(true) => promise,
                Ok(false) => {
                    debug!(instance = %name, "Session expired before refresh, starting again");
                    self.replace_expired(name, &promise, duration)
                }
                Err(err) => {
                    warn!(instance = %name, error = %err, "Failed to refresh session TTL");
                    promise
                }
            },
        }
    }

    /// Swap `expired` for a fresh start attempt, unless another request
    /// already replaced it.
    fn replace_expired(
        &self,
        name: &str,
        expired: &Promise<InstanceInfo>,
        duration: Duration,
    ) -> Promise<InstanceInfo> {
        let mut promises = self.promises.lock();
        if let Some(current) = promises.get(name) {
            if !current.ptr_eq(expired) {
                return current.clone();
            }
        }
        let promise = self.spawn_attempt(name, duration, true);
        promises.insert(name.to_string(), promise.clone());
        promise
    }

    /// Launch the executor for `name`. Caller holds the table lock; the
    /// executor itself runs on its own task.
    fn spawn_attempt(&self, name: &str, duration: Duration, start: bool) -> Promise<InstanceInfo> {
        let provider = Arc::clone(&self.provider);
        let store = Arc::clone(&self.store);
        let cancel = self.shutdown.clone();
        let timeout = self.config.provider_timeout;
        let name = name.to_string();

        Promise::from_future(async move {
            if start {
                info!(instance = %name, "Starting instance");
                bounded(&cancel, timeout, provider.instance_start(&cancel, &name)).await?;
            }
            let info =
                bounded(&cancel, timeout, provider.instance_inspect(&cancel, &name)).await?;
            debug!(instance = %name, status = %info.status, "Instance inspected");

            if let Err(err) = store.put(info.clone(), duration).await {
                warn!(instance = %name, error = %err, "Failed to track session");
            }
            Ok(info)
        })
    }

    /// Start-or-join every name concurrently and report once all are done.
    ///
    /// A zero `duration` uses the configured default. Per-instance failures
    /// land in that instance's slot and do not fail the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if `names` is empty.
    pub async fn request_session(&self, names: &[String], duration: Duration) -> Result<SessionState> {
        if names.is_empty() {
            return Err(Error::MissingField { field: "names" });
        }
        let duration = self.effective_duration(duration);

        let attempts = names.iter().map(|name| async move {
            let promise = self.request_instance(name, duration).await;
            (name.clone(), InstanceState::from_result(promise.settled().await))
        });

        Ok(join_all(attempts).await.into_iter().collect())
    }

    /// [`request_session`](Self::request_session) for every member of `group`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupNotFound`] or [`Error::EmptyGroup`] if the group
    /// cannot be resolved.
    pub async fn request_session_group(&self, group: &str, duration: Duration) -> Result<SessionState> {
        let names = self.resolve_group(group)?;
        self.request_session(&names, duration).await
    }

    pub(super) fn effective_duration(&self, duration: Duration) -> Duration {
        if duration.is_zero() {
            self.config.default_duration
        } else {
            duration
        }
    }
}
