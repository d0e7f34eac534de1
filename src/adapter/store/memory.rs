//! In-process store backed by the expiring registry.
//!
//! Sessions can be written to a JSON file on shutdown and restored on the
//! next start, so idle timers survive a restart.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::InstanceInfo;
use crate::error::Result;
use crate::infrastructure::tinykv::TinyKv;
use crate::port::{ExpireHook, Store};

/// [`Store`] keeping sessions in a [`TinyKv`].
pub struct MemoryStore {
    kv: TinyKv<InstanceInfo>,
}

impl MemoryStore {
    /// Create a store whose sweep wakes at least every `expiration_interval`.
    #[must_use]
    pub fn new(expiration_interval: Duration) -> Self {
        Self {
            kv: TinyKv::new(expiration_interval),
        }
    }

    /// Names currently tracked.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.kv.keys()
    }

    /// Write live sessions to `path` as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.kv.marshal_json()?;
        std::fs::write(path, bytes)?;
        info!(path = %path.display(), sessions = self.kv.len(), "Sessions saved");
        Ok(())
    }

    /// Restore sessions from `path`. A missing file restores nothing.
    ///
    /// Entries whose deadline passed while we were down are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load_from(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No saved sessions");
            return Ok(0);
        }
        let bytes = std::fs::read(path)?;
        let restored = self.kv.unmarshal_json(&bytes)?;
        info!(path = %path.display(), sessions = restored, "Sessions restored");
        Ok(restored)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, name: &str) -> Result<Option<InstanceInfo>> {
        Ok(self.kv.get(name))
    }

    async fn put(&self, info: InstanceInfo, ttl: Duration) -> Result<()> {
        self.kv.put(info.name.clone(), info, ttl);
        Ok(())
    }

    async fn touch(&self, name: &str, ttl: Duration) -> Result<bool> {
        Ok(self.kv.touch(name, ttl))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.kv.delete(name);
        Ok(())
    }

    fn on_expire(&self, hook: ExpireHook) -> Result<()> {
        self.kv.set_on_expire(move |name, _| hook(name));
        Ok(())
    }
}
