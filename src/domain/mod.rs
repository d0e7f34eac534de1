//! Backend-agnostic domain types.

mod instance;
mod session;

pub use instance::{InstanceConfig, InstanceInfo, InstanceStatus, ListOptions};
pub use session::{InstanceState, SessionState, SessionStatus};
