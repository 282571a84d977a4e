//! Cache facade that degrades to the in-process store.
//!
//! Cache failures never reach callers: a read that cannot be served is a
//! miss, and a write that cannot reach Redis lands in the fallback store.

use super::{CacheStore, KeyPattern, MemoryCacheStore};
use crate::metrics;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use tidings_core::Interface;
use tracing::{debug, warn};

/// Store that accepted a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    /// Written to the distributed cache.
    Primary,
    /// Written to the fallback store.
    Fallback,
    /// Not written because the value could not be serialized.
    Skipped,
}

/// Typed cache access over a primary store and the fallback store.
#[derive(Clone)]
pub struct ResilientCache {
    primary: Arc<dyn CacheStore>,
    fallback: Arc<MemoryCacheStore>,
}

impl ResilientCache {
    /// Creates a facade over `primary` with `fallback` as the degraded path.
    #[must_use]
    pub fn new(primary: Arc<dyn CacheStore>, fallback: Arc<MemoryCacheStore>) -> Self {
        Self { primary, fallback }
    }

    /// Whether the primary store currently accepts operations.
    #[must_use]
    pub fn primary_available(&self) -> bool {
        self.primary.is_available()
    }

    /// The fallback store.
    #[must_use]
    pub fn fallback(&self) -> &Arc<MemoryCacheStore> {
        &self.fallback
    }

    /// Looks up `key`.
    ///
    /// A primary miss is final. The fallback is consulted only when the
    /// primary is unavailable or holds a value that does not deserialize.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if self.primary.is_available() {
            match self.primary.get_raw(key).await {
                Ok(Some(json)) => match serde_json::from_str(&json) {
                    Ok(value) => {
                        metrics::record_hit(self.primary.name());
                        return Some(value);
                    }
                    Err(e) => warn!("Discarding undecodable cache entry '{}': {}", key, e),
                },
                Ok(None) => {
                    metrics::record_miss(self.primary.name());
                    return None;
                }
                Err(e) => warn!("Cache read for '{}' failed, using fallback: {}", key, e),
            }
        }

        metrics::record_fallback("get");
        self.get_from_fallback(key)
    }

    fn get_from_fallback<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.fallback.name();
        let Some(json) = self.fallback.get(key) else {
            metrics::record_miss(store);
            return None;
        };

        match serde_json::from_str(&json) {
            Ok(value) => {
                debug!("Fallback cache hit for key '{}'", key);
                metrics::record_hit(store);
                Some(value)
            }
            Err(e) => {
                warn!("Discarding undecodable fallback entry '{}': {}", key, e);
                metrics::record_miss(store);
                None
            }
        }
    }

    /// Stores `value` under `key` for `ttl` and reports where it went.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> CacheWrite {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!("Not caching '{}': serialization failed: {}", key, e);
                return CacheWrite::Skipped;
            }
        };

        if self.primary.is_available() {
            match self.primary.set_raw(key, &json, ttl).await {
                Ok(()) => {
                    metrics::record_write(self.primary.name());
                    return CacheWrite::Primary;
                }
                Err(e) => warn!("Cache write for '{}' failed, using fallback: {}", key, e),
            }
        }

        self.fallback.set(key, &json, ttl);
        metrics::record_fallback("set");
        metrics::record_write(self.fallback.name());
        CacheWrite::Fallback
    }

    /// Removes every key matching `pattern` from both stores.
    ///
    /// Returns the total number of keys removed.
    pub async fn delete_matching(&self, pattern: &KeyPattern) -> u64 {
        let mut deleted = 0;

        if self.primary.is_available() {
            match self.primary.delete_matching(pattern.as_str()).await {
                Ok(count) => deleted += count,
                Err(e) => warn!("Invalidation of '{}' in {} failed: {}", pattern, self.primary.name(), e),
            }
        }

        deleted += self.fallback.remove_matching(pattern);
        metrics::record_invalidated(deleted);
        debug!("Invalidated {} keys matching '{}'", deleted, pattern);
        deleted
    }
}

/// Hands out the process-wide [`ResilientCache`].
pub trait CacheLayer: Interface + Send + Sync {
    /// Facade over the shared primary and fallback stores.
    fn cache(&self) -> ResilientCache;
}

impl CacheLayer for ResilientCache {
    fn cache(&self) -> ResilientCache {
        self.clone()
    }
}

/// Component pairing the injected primary store with the fallback store.
#[derive(Component)]
#[shaku(interface = CacheLayer)]
pub struct CacheLayerComponent {
    #[shaku(inject)]
    primary: Arc<dyn CacheStore>,
    fallback: Arc<MemoryCacheStore>,
}

impl CacheLayer for CacheLayerComponent {
    fn cache(&self) -> ResilientCache {
        ResilientCache::new(Arc::clone(&self.primary), Arc::clone(&self.fallback))
    }
}
