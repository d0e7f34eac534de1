//! Capability traits consumed by the session core (hexagonal ports).
//!
//! Ports are the seams where backends plug in. The core depends only on
//! these traits, never on a concrete backend.
//!
//! ```text
//!                  ┌──────────────────────┐
//!                  │    SessionManager    │
//!                  └──────────┬───────────┘
//!              ┌──────────────┴──────────────┐
//!              ▼                             ▼
//!        ┌──────────┐                  ┌──────────┐
//!        │ Provider │                  │  Store   │
//!        └──────────┘                  └──────────┘
//!   docker / swarm / k8s / ...     in-memory / remote kv
//! ```
//!
//! # Available Ports
//!
//! - [`Provider`] - start, stop, inspect and discover instances
//! - [`Store`] - TTL-tracked session registry with expiry notification

mod provider;
mod store;

pub use provider::{GroupMap, Provider};
pub use store::{ExpireHook, Store};
