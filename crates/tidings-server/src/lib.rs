//! # Tidings Server Library
//!
//! Dependency wiring and startup utilities for the Tidings server.

pub mod di;
pub mod startup;
