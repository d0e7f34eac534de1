//! Consumer for instances stopped outside our control.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::SessionManager;

/// Capacity of the stopped-instance channel.
const STOPPED_CHANNEL_CAPACITY: usize = 64;

impl SessionManager {
    /// Forget the session of every instance the provider reports stopped,
    /// so the next request starts it again.
    pub(super) async fn consume_stopped_instances(self: Arc<Self>) {
        let (tx, mut rx) = mpsc::channel(STOPPED_CHANNEL_CAPACITY);

        let provider = Arc::clone(&self.provider);
        let cancel = self.shutdown.clone();
        let producer = tokio::spawn(async move {
            provider.notify_instance_stopped(&cancel, tx).await;
        });

        debug!("Stopped-instance consumer started");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                name = rx.recv() => {
                    let Some(name) = name else {
                        debug!("Provider event stream ended");
                        break;
                    };
                    info!(instance = %name, "Instance stopped externally, removing session");
                    if let Err(err) = self.remove_instance(&name).await {
                        warn!(instance = %name, error = %err, "Failed to remove session");
                    }
                }
            }
        }

        producer.abort();
        debug!("Stopped-instance consumer stopped");
    }
}
