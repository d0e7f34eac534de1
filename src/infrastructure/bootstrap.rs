//! Composition root: wire the store, the session manager and a provider.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::store::MemoryStore;
use crate::application::cancel::CancelToken;
use crate::application::session::SessionManager;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{Provider, Store};

/// A running session manager and the store behind it.
pub struct Runtime {
    manager: Arc<SessionManager>,
    store: Arc<MemoryStore>,
    storage_file: Option<PathBuf>,
}

impl Runtime {
    #[must_use]
    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    #[must_use]
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Stop background tasks, then persist live sessions if storage is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the sessions cannot be written.
    pub async fn shutdown(self) -> Result<()> {
        self.manager.shutdown().await;
        if let Some(path) = &self.storage_file {
            self.store.save_to(path)?;
        }
        Ok(())
    }
}

/// Build and start a runtime for `provider`.
///
/// Restores persisted sessions first, so reconciliation does not stop
/// instances that were tracked before the restart. Must be called within a
/// Tokio runtime.
///
/// # Errors
///
/// Returns an error if persisted sessions cannot be read. A failed startup
/// reconciliation is logged and does not abort startup.
pub async fn build(config: &Config, provider: Arc<dyn Provider>) -> Result<Runtime> {
    let store = Arc::new(MemoryStore::new(config.sessions.expiration_interval()));
    if let Some(path) = &config.storage.file {
        store.load_from(path)?;
    }

    let manager = SessionManager::new(
        Arc::clone(&provider),
        Arc::clone(&store) as Arc<dyn Store>,
        config.session_config(),
    )?;
    manager.start();

    if config.provider.auto_stop_on_startup {
        let cancel = CancelToken::new();
        if let Err(err) = manager.stop_all_unregistered_instances(&cancel).await {
            warn!(error = %err, "Stopping unregistered instances failed");
        }
    }

    info!(
        provider = provider.provider_name(),
        restored = store.names().len(),
        "Runtime ready"
    );
    Ok(Runtime {
        manager,
        store,
        storage_file: config.storage.file.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::provider::ScriptedProvider;
    use std::time::Duration;

    fn config_with(file: Option<PathBuf>, auto_stop: bool) -> Config {
        let mut config = Config::default();
        config.storage.file = file;
        config.provider.auto_stop_on_startup = auto_stop;
        config
    }

    #[tokio::test]
    async fn startup_stops_untracked_instances() {
        let provider = Arc::new(ScriptedProvider::new().with_instances(&["a", "b"]));
        let runtime = build(&config_with(None, true), provider.clone())
            .await
            .unwrap();

        assert_eq!(provider.stop_count("a"), 1);
        assert_eq!(provider.stop_count("b"), 1);
        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn startup_reconciliation_can_be_disabled() {
        let provider = Arc::new(ScriptedProvider::new().with_instances(&["a"]));
        let runtime = build(&config_with(None, false), provider.clone())
            .await
            .unwrap();

        assert_eq!(provider.total_stops(), 0);
        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn sessions_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sessions.json");
        let config = config_with(Some(file.clone()), true);

        let provider = Arc::new(ScriptedProvider::new().with_instances(&["web"]));
        let runtime = build(&config, provider.clone()).await.unwrap();
        runtime
            .manager()
            .request_session(&["web".to_string()], Duration::from_secs(600))
            .await
            .unwrap();
        runtime.shutdown().await.unwrap();
        assert!(file.exists());

        // Restored before reconciliation, so the tracked instance is kept.
        let provider = Arc::new(ScriptedProvider::new().with_instances(&["web", "idle"]));
        let runtime = build(&config, provider.clone()).await.unwrap();
        assert_eq!(runtime.store().names(), vec!["web".to_string()]);
        assert_eq!(provider.stop_count("web"), 0);
        assert_eq!(provider.stop_count("idle"), 1);
        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_storage_file_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sessions.json");
        std::fs::write(&file, b"not json").unwrap();

        let provider = Arc::new(ScriptedProvider::new());
        let outcome = build(&config_with(Some(file), false), provider).await;
        assert!(outcome.is_err());
    }
}
