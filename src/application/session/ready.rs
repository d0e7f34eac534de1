//! Bounded waiting for a session to become ready.

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::SessionManager;
use crate::application::cancel::CancelToken;
use crate::domain::SessionState;
use crate::error::{Error, Result};

impl SessionManager {
    /// Request a session and wait until every member is ready.
    ///
    /// Re-checks every `ready_poll_interval`. Whichever happens first wins:
    /// caller cancellation, a re-check error, readiness, or `timeout`
    /// elapsing. The losing poller and timer are dropped, which abandons
    /// local waiting only; starts already in flight run to completion.
    ///
    /// A zero `timeout` uses the configured `blocking_timeout`.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingField`] if `names` is empty
    /// - [`Error::Cancelled`] if `cancel` fires first
    /// - [`Error::Timeout`] if the session is not ready within `timeout`
    pub async fn request_ready_session(
        &self,
        cancel: &CancelToken,
        names: &[String],
        duration: Duration,
        timeout: Duration,
    ) -> Result<SessionState> {
        if names.is_empty() {
            return Err(Error::MissingField { field: "names" });
        }
        let timeout = self.effective_timeout(timeout);

        let poll = async {
            let session = self.request_session(names, duration).await?;
            if session.is_ready() {
                return Ok(session);
            }

            let period = self.config.ready_poll_interval;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let session = self.request_session(names, duration).await?;
                if session.is_ready() {
                    return Ok(session);
                }
                debug!(instances = ?names, "Session not ready yet");
            }
        };

        tokio::select! {
            cause = cancel.cancelled() => {
                info!(instances = ?names, cause = %cause, "Readiness wait cancelled");
                Err(Error::Cancelled { cause })
            }
            outcome = poll => outcome,
            () = tokio::time::sleep(timeout) => {
                info!(instances = ?names, ?timeout, "Session not ready before timeout");
                Err(Error::Timeout { duration: timeout })
            }
        }
    }

    /// [`request_ready_session`](Self::request_ready_session) for every
    /// member of `group`.
    ///
    /// # Errors
    ///
    /// Group resolution errors, plus everything the single variant returns.
    pub async fn request_ready_session_group(
        &self,
        cancel: &CancelToken,
        group: &str,
        duration: Duration,
        timeout: Duration,
    ) -> Result<SessionState> {
        let names = self.resolve_group(group)?;
        self.request_ready_session(cancel, &names, duration, timeout)
            .await
    }

    fn effective_timeout(&self, timeout: Duration) -> Duration {
        if timeout.is_zero() {
            self.config.blocking_timeout
        } else {
            timeout
        }
    }
}
