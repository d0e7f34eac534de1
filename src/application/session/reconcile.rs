//! Startup reconciliation: stop instances no session accounts for.

use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::{bounded, SessionManager};
use crate::application::cancel::CancelToken;
use crate::domain::ListOptions;
use crate::error::{Error, Result};

impl SessionManager {
    /// Stop every enabled instance that has neither a tracked session nor a
    /// start in flight.
    ///
    /// Stops run concurrently, at most `stop_concurrency` at a time. Every
    /// stop is issued even if an earlier one fails; the first failure
    /// observed is returned.
    ///
    /// # Errors
    ///
    /// Returns the listing error, a store lookup error, or the first stop
    /// error.
    pub async fn stop_all_unregistered_instances(&self, cancel: &CancelToken) -> Result<()> {
        let timeout = self.config.provider_timeout;
        let instances = bounded(
            cancel,
            timeout,
            self.provider.instance_list(cancel, ListOptions::default()),
        )
        .await?;

        let mut unregistered = Vec::new();
        for instance in instances {
            if self.is_in_flight(&instance.name) {
                continue;
            }
            if self.store.get(&instance.name).await?.is_none() {
                unregistered.push(instance.name);
            }
        }

        if unregistered.is_empty() {
            debug!("No unregistered instances to stop");
            return Ok(());
        }
        info!(count = unregistered.len(), instances = ?unregistered, "Stopping unregistered instances");

        let permits = Arc::new(Semaphore::new(self.config.stop_concurrency.max(1)));
        let mut stops: FuturesUnordered<_> = unregistered
            .into_iter()
            .map(|name| {
                let provider = Arc::clone(&self.provider);
                let permits = Arc::clone(&permits);
                let cancel = cancel.clone();
                // Spawned so a returned error does not abandon the other stops.
                tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|e| Error::provider(&name, e))?;
                    let outcome =
                        bounded(&cancel, timeout, provider.instance_stop(&cancel, &name)).await;
                    if let Err(err) = &outcome {
                        warn!(instance = %name, error = %err, "Failed to stop unregistered instance");
                    }
                    outcome
                })
            })
            .collect();

        while let Some(joined) = stops.next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(err),
                Err(join) => return Err(Error::Panicked(join.to_string())),
            }
        }
        Ok(())
    }

    fn is_in_flight(&self, name: &str) -> bool {
        self.promises
            .lock()
            .get(name)
            .is_some_and(|promise| promise.is_pending())
    }
}
