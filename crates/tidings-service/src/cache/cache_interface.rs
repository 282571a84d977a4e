//! Cache store trait shared by the distributed cache and the fallback store.

use async_trait::async_trait;
use std::time::Duration;
use tidings_core::{Interface, TidingsResult};

/// Key/value store holding JSON strings with a per-entry TTL.
///
/// Uses JSON strings for type-erased storage to maintain dyn-compatibility;
/// typed access goes through [`ResilientCache`](super::ResilientCache).
///
/// Implementations report connectivity problems as
/// [`TidingsError::CacheUnavailable`](tidings_core::TidingsError::CacheUnavailable)
/// and never leak transport errors.
#[async_trait]
pub trait CacheStore: Interface + Send + Sync {
    /// Get a raw JSON value from the store.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_raw(&self, key: &str) -> TidingsResult<Option<String>>;

    /// Set a raw JSON value with a TTL.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> TidingsResult<()>;

    /// Delete every key matching `pattern` (`prefix*` or an exact key).
    ///
    /// Returns the number of keys deleted.
    async fn delete_matching(&self, pattern: &str) -> TidingsResult<u64>;

    /// Whether the store currently accepts operations.
    fn is_available(&self) -> bool;

    /// Short name used in logs and metric labels.
    fn name(&self) -> &'static str;
}
