//! Cache-aside fetching with retries.

use crate::cache::{CacheKey, ResilientCache};
use crate::metrics;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tidings_core::{TidingsError, TidingsResult};
use tidings_resilience::{with_timeout, RetryPolicy};
use tracing::{debug, warn};

/// Default bound on a single upstream attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Retry and timeout settings for upstream fetches.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    /// Retry schedule for retriable failures.
    pub retry: RetryPolicy,
    /// Bound on each attempt.
    pub attempt_timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

/// Looks a value up in the cache and, on a miss, fetches it from upstream
/// with retries and caches the result.
#[derive(Clone)]
pub struct CacheAside {
    cache: ResilientCache,
    retry: RetryPolicy,
    attempt_timeout: Duration,
    source: &'static str,
}

impl CacheAside {
    /// Creates a fetcher for the upstream named `source`.
    #[must_use]
    pub fn new(
        cache: ResilientCache,
        retry: RetryPolicy,
        attempt_timeout: Duration,
        source: &'static str,
    ) -> Self {
        Self {
            cache,
            retry,
            attempt_timeout,
            source,
        }
    }

    /// Creates a fetcher that follows `policy`.
    #[must_use]
    pub fn with_policy(cache: ResilientCache, policy: &FetchPolicy, source: &'static str) -> Self {
        Self::new(cache, policy.retry.clone(), policy.attempt_timeout, source)
    }

    /// The underlying cache.
    #[must_use]
    pub fn cache(&self) -> &ResilientCache {
        &self.cache
    }

    /// Returns the cached value for `key` or fetches, caches, and returns it.
    ///
    /// Each attempt is bounded by the attempt timeout. Failures are never
    /// cached and surface as normalized upstream errors.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &CacheKey, ttl: Duration, fetch: F) -> TidingsResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = TidingsResult<T>>,
    {
        let key = key.build();

        if let Some(hit) = self.cache.get::<T>(&key).await {
            debug!("Serving '{}' from cache", key);
            return Ok(hit);
        }

        let source = self.source;
        let result = self
            .retry
            .execute_observed(
                TidingsError::is_retriable,
                |attempt| {
                    metrics::record_retry(source);
                    warn!(
                        "{} request failed ({}); attempt {} in {:?}",
                        source, attempt.last_error, attempt.attempt_number, attempt.delay
                    );
                },
                || with_timeout(self.attempt_timeout, &fetch),
            )
            .await;

        match result {
            Ok(value) => {
                let write = self.cache.set(&key, &value, ttl).await;
                debug!("Cached '{}' ({:?})", key, write);
                Ok(value)
            }
            Err(e) => {
                let err = e.into_upstream();
                if let Some(upstream) = err.as_upstream() {
                    metrics::record_upstream_failure(source, upstream.kind);
                }
                warn!("{} request for '{}' failed: {}", source, key, err);
                Err(err)
            }
        }
    }
}
