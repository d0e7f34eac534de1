//! Application services.
//!
//! The session engine and the asynchronous building blocks it is made of.

pub mod cancel;
pub mod promise;
pub mod session;
