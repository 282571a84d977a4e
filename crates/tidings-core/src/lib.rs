//! # Tidings Core
//!
//! Core types shared by every Tidings crate: the unified error taxonomy,
//! normalized upstream errors, result aliases, and the clock abstraction
//! used for TTL bookkeeping.

pub mod clock;
pub mod error;
pub mod result;
pub mod upstream;

pub use clock::*;
pub use error::*;
pub use result::*;
pub use upstream::*;

// Re-export shaku for dependency injection
pub use shaku::Interface;
