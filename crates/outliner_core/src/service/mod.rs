//! Use-case facades over the pure graph and tree operations.
//!
//! # Responsibility
//! - Hold the values a host would otherwise thread through every call.
//! - Keep hosts decoupled from the value-in/value-out core API.

pub mod session;
