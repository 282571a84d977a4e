//! Result type aliases for Tidings.

use crate::TidingsError;

/// A specialized `Result` type for Tidings operations.
pub type TidingsResult<T> = Result<T, TidingsError>;
