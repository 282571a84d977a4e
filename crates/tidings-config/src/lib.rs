//! # Tidings Config
//!
//! Configuration management for Tidings.
//! Supports layered configuration from files, environment variables,
//! and conventional variables such as `REDIS_HOST` or `NEWS_API_KEY`.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
