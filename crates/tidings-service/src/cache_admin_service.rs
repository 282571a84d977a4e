//! Cache administration: authenticated invalidation and scheduled purges.

use crate::cache::{cache_keys, CacheLayer, KeyPattern, ResilientCache};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use tidings_core::{Interface, TidingsError, TidingsResult};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use utoipa::ToSchema;

/// Outcome of an invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InvalidationResult {
    /// Pattern that was applied.
    pub pattern: String,
    /// Number of keys removed across both stores.
    pub deleted: u64,
}

/// Authenticated cache invalidation.
#[async_trait]
pub trait CacheAdminService: Interface + Send + Sync {
    /// Checks `credential` against the configured secret in constant time.
    fn authorize(&self, credential: Option<&str>) -> TidingsResult<()>;

    /// Removes every key matching `pattern` (default `news:*`).
    ///
    /// The credential must equal the configured secret exactly; the cache is
    /// not touched otherwise.
    async fn invalidate(
        &self,
        credential: Option<&str>,
        pattern: Option<&str>,
    ) -> TidingsResult<InvalidationResult>;
}

/// Guards cache invalidation behind a shared secret.
///
/// With no secret, or an empty one, every request is rejected.
#[derive(Component)]
#[shaku(interface = CacheAdminService)]
pub struct CacheAdminServiceComponent {
    #[shaku(inject)]
    cache: Arc<dyn CacheLayer>,
    secret: Option<String>,
}

impl CacheAdminServiceComponent {
    /// Creates a service outside a module.
    #[must_use]
    pub fn new(cache: Arc<dyn CacheLayer>, secret: Option<String>) -> Self {
        if !secret_configured(secret.as_deref()) {
            warn!("Cache invalidation key not configured; invalidation is disabled");
        }
        Self { cache, secret }
    }
}

#[async_trait]
impl CacheAdminService for CacheAdminServiceComponent {
    fn authorize(&self, credential: Option<&str>) -> TidingsResult<()> {
        let secret = self.secret.as_deref().filter(|s| !s.is_empty());
        match (secret, credential) {
            (Some(secret), Some(given)) if credential_matches(secret, given) => Ok(()),
            (None, _) => Err(TidingsError::unauthorized("Cache invalidation is not enabled")),
            (Some(_), None) => Err(TidingsError::unauthorized("Missing invalidation key")),
            (Some(_), Some(_)) => Err(TidingsError::unauthorized("Invalid invalidation key")),
        }
    }

    async fn invalidate(
        &self,
        credential: Option<&str>,
        pattern: Option<&str>,
    ) -> TidingsResult<InvalidationResult> {
        self.authorize(credential)?;

        let pattern = match pattern {
            Some(raw) => KeyPattern::parse(raw)?,
            None => cache_keys::news_pattern(),
        };

        let deleted = self.cache.cache().delete_matching(&pattern).await;
        info!("Invalidated {} cache keys matching '{}'", deleted, pattern);

        Ok(InvalidationResult {
            pattern: pattern.to_string(),
            deleted,
        })
    }
}

/// Whether `secret` enables invalidation.
#[must_use]
pub fn secret_configured(secret: Option<&str>) -> bool {
    secret.is_some_and(|s| !s.is_empty())
}

fn credential_matches(secret: &str, given: &str) -> bool {
    secret.as_bytes().ct_eq(given.as_bytes()).into()
}

/// Spawns a task that invalidates every news entry each `every`.
///
/// The first run happens one full interval after spawning.
pub fn spawn_stale_news_invalidation(cache: ResilientCache, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let pattern = cache_keys::news_pattern();
        let start = tokio::time::Instant::now() + every;
        let mut ticker = tokio::time::interval_at(start, every);
        loop {
            ticker.tick().await;
            let deleted = cache.delete_matching(&pattern).await;
            info!("Scheduled invalidation removed {} stale news entries", deleted);
        }
    })
}
