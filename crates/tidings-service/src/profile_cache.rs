//! Cache for user-profile documents.

use crate::cache::{cache_keys, ResilientCache};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tidings_core::{TidingsError, TidingsResult};
use tracing::debug;

/// Caches opaque profile documents under `user:{subject}`.
#[derive(Clone)]
pub struct ProfileCache {
    cache: ResilientCache,
    ttl: Duration,
}

impl ProfileCache {
    #[must_use]
    pub fn new(cache: ResilientCache, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Returns the cached profile for `subject`, if any.
    pub async fn cached(&self, subject: &str) -> Option<Value> {
        let key = key_for(subject).ok()?;
        self.cache.get(&key).await
    }

    /// Caches `profile` for `subject`.
    pub async fn store(&self, subject: &str, profile: &Value) -> TidingsResult<()> {
        let key = key_for(subject)?;
        let write = self.cache.set(&key, profile, self.ttl).await;
        debug!("Cached profile '{}' ({:?})", key, write);
        Ok(())
    }

    /// Returns the cached profile or loads, caches, and returns it.
    ///
    /// A missing profile (`Ok(None)` from the loader) is not cached.
    pub async fn get_or_load<F, Fut>(&self, subject: &str, loader: F) -> TidingsResult<Option<Value>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TidingsResult<Option<Value>>>,
    {
        let key = key_for(subject)?;
        if let Some(hit) = self.cache.get::<Value>(&key).await {
            return Ok(Some(hit));
        }

        let loaded = loader().await?;
        if let Some(profile) = &loaded {
            self.cache.set(&key, profile, self.ttl).await;
        }
        Ok(loaded)
    }
}

fn key_for(subject: &str) -> TidingsResult<String> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(TidingsError::validation("Profile subject must not be empty"));
    }
    Ok(cache_keys::user_profile(subject).build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn profiles() -> (ProfileCache, Arc<MemoryCacheStore>) {
        let primary = Arc::new(MemoryCacheStore::new(100));
        let cache = ResilientCache::new(primary.clone(), Arc::new(MemoryCacheStore::new(100)));
        (ProfileCache::new(cache, Duration::from_secs(7200)), primary)
    }

    #[tokio::test]
    async fn test_store_and_read_back() {
        let (profiles, primary) = profiles();
        let profile = json!({"name": "Ada", "interests": ["technology"]});

        profiles.store("auth0|42", &profile).await.unwrap();

        assert_eq!(profiles.cached("auth0|42").await, Some(profile));
        assert!(primary.get("user:auth0|42").is_some());
        assert_eq!(profiles.cached("auth0|7").await, None);
    }

    #[tokio::test]
    async fn test_subjects_differing_in_case_do_not_share_entries() {
        let (profiles, _) = profiles();
        profiles.store("AbC", &json!({"name": "Ada"})).await.unwrap();

        assert_eq!(profiles.cached("abc").await, None);
        assert_eq!(profiles.cached("AbC").await, Some(json!({"name": "Ada"})));
    }

    #[tokio::test]
    async fn test_get_or_load_caches_found_profiles_only() {
        let (profiles, primary) = profiles();
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let loaded = profiles
                .get_or_load("ghost", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .await
                .unwrap();
            assert_eq!(loaded, None);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(primary.is_empty());

        for _ in 0..2 {
            profiles
                .get_or_load("ada", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(json!({"name": "Ada"})))
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_blank_subject_is_rejected() {
        let (profiles, _) = profiles();
        let err = profiles.store(" ", &json!({})).await.unwrap_err();
        assert!(matches!(err, TidingsError::Validation(_)));
    }
}
