//! Infrastructure configuration modules.

pub mod logging;
pub mod provider;
pub mod session;
pub mod settings;
