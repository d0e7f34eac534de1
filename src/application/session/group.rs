//! Group table: resolution and periodic refresh.

use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::{bounded, SessionManager};
use crate::error::{Error, Result};
use crate::port::GroupMap;

impl SessionManager {
    /// Current group table. The snapshot never changes under the caller.
    #[must_use]
    pub fn groups(&self) -> Arc<GroupMap> {
        Arc::clone(&self.groups.read())
    }

    /// Replace the group table.
    pub fn set_groups(&self, groups: GroupMap) {
        *self.groups.write() = Arc::new(groups);
    }

    /// Fetch groups from the provider and replace the table.
    ///
    /// # Errors
    ///
    /// Returns the provider error; the previous table is kept.
    pub async fn refresh_groups(&self) -> Result<()> {
        let groups = bounded(
            &self.shutdown,
            self.config.provider_timeout,
            self.provider.instance_groups(&self.shutdown),
        )
        .await?;
        debug!(groups = groups.len(), "Group table refreshed");
        self.set_groups(groups);
        Ok(())
    }

    /// Member names of `group`, in provider order.
    pub(super) fn resolve_group(&self, group: &str) -> Result<Vec<String>> {
        let groups = self.groups();
        let Some(names) = groups.get(group) else {
            let mut available_groups: Vec<String> = groups.keys().cloned().collect();
            available_groups.sort();
            return Err(Error::GroupNotFound {
                group: group.to_string(),
                available_groups,
            });
        };
        if names.is_empty() {
            return Err(Error::EmptyGroup {
                group: group.to_string(),
            });
        }
        Ok(names.clone())
    }

    /// Refresh the group table every `group_refresh_interval` until shutdown.
    pub(super) async fn watch_groups(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.group_refresh_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!("Group watcher started");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(err) = self.refresh_groups().await {
                        if self.shutdown.is_cancelled() {
                            break;
                        }
                        warn!(error = %err, "Group refresh failed, keeping previous table");
                    }
                }
            }
        }
        debug!("Group watcher stopped");
    }
}
