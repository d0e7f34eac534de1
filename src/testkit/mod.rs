//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`provider`] - [`ScriptedProvider`](provider::ScriptedProvider), a
//!   [`Provider`](crate::port::Provider) with scripted inspections and call
//!   counters.
//! - [`config`] - Canonical fast test configurations.

pub mod config;
pub mod provider;
