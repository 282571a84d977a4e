//! # Tidings Resilience
//!
//! Resilience patterns for Tidings.
//! Provides bounded retry with exponential backoff and per-attempt timeouts.

pub mod retry;
pub mod timeout;

pub use retry::*;
pub use timeout::*;
