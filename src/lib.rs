//! Dormant - scale-to-zero session orchestration.
//!
//! Keeps on-demand workloads asleep until someone asks for them. A request
//! for an instance starts it (once, however many callers ask at the same
//! time), tracks it with an idle TTL, and stops it again when nobody has
//! asked for it within that TTL.
//!
//! # Modules
//!
//! - [`domain`] - Instance snapshots and session state
//! - [`port`] - Capability traits: [`port::Provider`] and [`port::Store`]
//! - [`application`] - Cancellation, promises and the session manager
//! - [`adapter`] - In-process store with file persistence
//! - [`infrastructure`] - Expiring registry, configuration and bootstrap
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use dormant::infrastructure::bootstrap;
//! use dormant::infrastructure::config::settings::Config;
//! use dormant::port::Provider;
//!
//! async fn serve(provider: Arc<dyn Provider>) -> dormant::error::Result<()> {
//!     let config = Config::load("dormant.toml")?;
//!     config.init_logging();
//!
//!     let runtime = bootstrap::build(&config, provider).await?;
//!     let session = runtime
//!         .manager()
//!         .request_session(&["nginx".to_string()], Duration::from_secs(300))
//!         .await?;
//!     println!("{}", serde_json::to_string(&session)?);
//!
//!     runtime.shutdown().await
//! }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use application::cancel::CancelToken;
pub use application::promise::Promise;
pub use application::session::{SessionConfig, SessionManager};
pub use error::{Error, Result};
