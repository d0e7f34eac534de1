//! Store port for session TTL tracking.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::InstanceInfo;
use crate::error::Result;

/// Invoked with the instance name when its entry expires naturally.
pub type ExpireHook = Arc<dyn Fn(String) + Send + Sync>;

/// TTL-bounded registry of instances with an active session.
///
/// # Implementation Notes
///
/// - `put` inserts or replaces and resets the TTL.
/// - `touch` resets the TTL of a live entry only; an entry past its TTL
///   stays expired and keeps its pending expiry.
/// - `get` reports `None` once the TTL has elapsed, even before eviction.
/// - The hook registered with `on_expire` fires at most once per natural
///   expiry and never for an explicit `delete`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Tracked snapshot for `name`, if its TTL has not elapsed.
    async fn get(&self, name: &str) -> Result<Option<InstanceInfo>>;

    /// Track `info` under its name for `ttl`.
    async fn put(&self, info: InstanceInfo, ttl: Duration) -> Result<()>;

    /// Slide the TTL of `name` if it is still live. Returns false if the
    /// entry is absent or already expired.
    async fn touch(&self, name: &str, ttl: Duration) -> Result<bool>;

    /// Stop tracking `name` without firing the expiry hook.
    async fn delete(&self, name: &str) -> Result<()>;

    /// Register the natural-expiry hook.
    fn on_expire(&self, hook: ExpireHook) -> Result<()>;
}
