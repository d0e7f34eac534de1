//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! session logic.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`tinykv`] - Expiring key-value registry

pub mod bootstrap;
pub mod config;
pub mod tinykv;
