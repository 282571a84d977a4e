//! Dependency injection module using Shaku.
//!
//! `TidingsModule` holds the process-wide component graph: the Redis client,
//! the cache layer, the upstream clients, and the services built on them.
//! `AppModuleBuilder` feeds it configuration and swaps components out before
//! `build()`, which is how tests run without network access.

use shaku::{module, HasComponent};
use std::sync::Arc;
use std::time::Duration;
use tidings_config::{AppConfig, RetryConfig};
use tidings_core::TidingsResult;
use tidings_resilience::RetryPolicy;
use tidings_rest::AppState;
use tidings_service::{
    secret_configured, CacheAdminService, CacheAdminServiceComponent,
    CacheAdminServiceComponentParameters, CacheLayer, CacheLayerComponent,
    CacheLayerComponentParameters, CacheStore, FetchPolicy, MemoryCacheStore, NewsApiClient,
    NewsProvider, NewsService, NewsServiceComponent, NewsServiceComponentParameters,
    PodcastApiClient, PodcastProvider, PodcastService, PodcastServiceComponent,
    PodcastServiceComponentParameters, PodcastTtls, ProfileCache, RedisCacheClient,
    ResilientCache,
};
use tracing::{info, warn};

// ============================================================================
// Shaku Module Definition
// ============================================================================

module! {
    pub TidingsModule {
        components = [
            RedisCacheClient,
            CacheLayerComponent,
            NewsApiClient,
            PodcastApiClient,
            NewsServiceComponent,
            PodcastServiceComponent,
            CacheAdminServiceComponent,
        ],
        providers = [],
    }
}

// ============================================================================
// Resolvers
// ============================================================================

/// Resolves the services from a module.
pub trait ServiceResolver {
    /// Resolves the news service.
    fn news_service(&self) -> Arc<dyn NewsService>;

    /// Resolves the podcast service.
    fn podcast_service(&self) -> Arc<dyn PodcastService>;

    /// Resolves the cache administration service.
    fn cache_admin(&self) -> Arc<dyn CacheAdminService>;
}

impl ServiceResolver for TidingsModule {
    fn news_service(&self) -> Arc<dyn NewsService> {
        self.resolve()
    }

    fn podcast_service(&self) -> Arc<dyn PodcastService> {
        self.resolve()
    }

    fn cache_admin(&self) -> Arc<dyn CacheAdminService> {
        self.resolve()
    }
}

/// Resolves the cache layer from a module.
pub trait CacheResolver {
    /// Resolves the cache layer.
    fn cache_layer(&self) -> Arc<dyn CacheLayer>;
}

impl CacheResolver for TidingsModule {
    fn cache_layer(&self) -> Arc<dyn CacheLayer> {
        self.resolve()
    }
}

// ============================================================================
// Application Module
// ============================================================================

/// The wired application.
pub struct AppModule {
    module: Arc<TidingsModule>,
    profile_ttl: Duration,
}

impl AppModule {
    /// The underlying component graph.
    pub fn module(&self) -> Arc<TidingsModule> {
        Arc::clone(&self.module)
    }

    /// The resilient cache facade.
    pub fn cache(&self) -> ResilientCache {
        self.module.cache_layer().cache()
    }

    /// The in-process fallback store.
    pub fn fallback(&self) -> Arc<MemoryCacheStore> {
        Arc::clone(self.cache().fallback())
    }

    pub fn news_service(&self) -> Arc<dyn NewsService> {
        self.module.news_service()
    }

    pub fn podcast_service(&self) -> Arc<dyn PodcastService> {
        self.module.podcast_service()
    }

    pub fn cache_admin(&self) -> Arc<dyn CacheAdminService> {
        self.module.cache_admin()
    }

    pub fn profile_cache(&self) -> ProfileCache {
        ProfileCache::new(self.cache(), self.profile_ttl)
    }

    /// State shared by the HTTP handlers.
    pub fn app_state(&self) -> AppState {
        AppState::new(
            self.news_service(),
            self.podcast_service(),
            self.cache_admin(),
            self.cache(),
        )
    }
}

/// Builder for [`AppModule`] over the shaku module builder.
pub struct AppModuleBuilder {
    config: AppConfig,
    primary: Option<Box<dyn CacheStore>>,
    news_provider: Option<Box<dyn NewsProvider>>,
    podcast_provider: Option<Box<dyn PodcastProvider>>,
}

impl AppModuleBuilder {
    /// Creates a builder for `config`.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            primary: None,
            news_provider: None,
            podcast_provider: None,
        }
    }

    /// Replaces the distributed cache.
    pub fn with_primary_cache(mut self, primary: Box<dyn CacheStore>) -> Self {
        self.primary = Some(primary);
        self
    }

    /// Replaces the news API client.
    pub fn with_news_provider(mut self, provider: Box<dyn NewsProvider>) -> Self {
        self.news_provider = Some(provider);
        self
    }

    /// Replaces the podcast API client.
    pub fn with_podcast_provider(mut self, provider: Box<dyn PodcastProvider>) -> Self {
        self.podcast_provider = Some(provider);
        self
    }

    /// Wires every component.
    pub fn build(self) -> TidingsResult<AppModule> {
        let config = self.config;
        let retry = retry_policy(&config.retry);

        if !secret_configured(config.admin.invalidation_key.as_deref()) {
            warn!("Cache invalidation key not configured; invalidation is disabled");
        }

        let mut builder = TidingsModule::builder()
            .with_component_parameters::<CacheLayerComponent>(CacheLayerComponentParameters {
                fallback: Arc::new(MemoryCacheStore::new(config.cache.fallback_max_entries)),
            })
            .with_component_parameters::<NewsServiceComponent>(NewsServiceComponentParameters {
                fetch: FetchPolicy {
                    retry: retry.clone(),
                    attempt_timeout: config.upstream.news.timeout(),
                },
                ttl: config.cache.news_ttl(),
            })
            .with_component_parameters::<PodcastServiceComponent>(PodcastServiceComponentParameters {
                fetch: FetchPolicy {
                    retry,
                    attempt_timeout: config.upstream.podcasts.timeout(),
                },
                ttls: PodcastTtls {
                    podcasts: config.cache.podcasts_ttl(),
                    episodes: config.cache.episodes_ttl(),
                },
            })
            .with_component_parameters::<CacheAdminServiceComponent>(
                CacheAdminServiceComponentParameters {
                    secret: config.admin.invalidation_key.clone(),
                },
            );

        builder = match self.primary {
            Some(primary) => builder.with_component_override::<dyn CacheStore>(primary),
            None => builder.with_component_parameters::<RedisCacheClient>(RedisCacheClient::parameters(
                &config.redis,
            )?),
        };
        builder = match self.news_provider {
            Some(provider) => builder.with_component_override::<dyn NewsProvider>(provider),
            None => builder
                .with_component_parameters::<NewsApiClient>(NewsApiClient::parameters(&config.upstream.news)?),
        };
        builder = match self.podcast_provider {
            Some(provider) => builder.with_component_override::<dyn PodcastProvider>(provider),
            None => builder.with_component_parameters::<PodcastApiClient>(PodcastApiClient::parameters(
                &config.upstream.podcasts,
            )?),
        };

        info!(
            "Application module built (redis enabled: {}, fallback capacity: {})",
            config.redis.enabled, config.cache.fallback_max_entries
        );

        Ok(AppModule {
            module: Arc::new(builder.build()),
            profile_ttl: config.cache.profile_ttl(),
        })
    }
}

/// Converts the configured retry settings into a policy.
pub fn retry_policy(config: &RetryConfig) -> RetryPolicy {
    RetryPolicy {
        max_attempts: config.max_attempts,
        initial_delay: config.initial_delay(),
        max_delay: config.max_delay(),
        backoff_factor: config.backoff_factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tidings_service::{CacheWrite, NewsQuery, NewsRequest, NewsResponse};

    fn offline_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.redis.enabled = false;
        config.admin.invalidation_key = Some("secret".to_string());
        config
    }

    /// News provider that counts calls and returns an empty page.
    struct CountingNews {
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl NewsProvider for CountingNews {
        async fn fetch_articles(&self, _request: &NewsRequest) -> TidingsResult<NewsResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(NewsResponse {
                total_results: 0,
                articles: Vec::new(),
            })
        }
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = RetryConfig {
            max_attempts: 4,
            initial_delay_ms: 250,
            max_delay_ms: 1000,
            backoff_factor: 3.0,
        };
        let policy = retry_policy(&config);
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.initial_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_disabled_redis_serves_from_fallback() {
        let module = AppModuleBuilder::new(offline_config()).build().unwrap();

        assert!(!module.cache().primary_available());

        let write = module
            .cache()
            .set("news:warmup", &1u32, Duration::from_secs(60))
            .await;
        assert_eq!(write, CacheWrite::Fallback);
        assert_eq!(module.fallback().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_primary_is_used() {
        let module = AppModuleBuilder::new(offline_config())
            .with_primary_cache(Box::new(MemoryCacheStore::new(10)))
            .build()
            .unwrap();

        assert!(module.cache().primary_available());
        module
            .profile_cache()
            .store("ada", &serde_json::json!({"name": "Ada"}))
            .await
            .unwrap();
        assert!(module
            .cache()
            .get::<serde_json::Value>("user:ada")
            .await
            .is_some());
        assert!(module.fallback().is_empty());

        let deleted = module
            .cache_admin()
            .invalidate(Some("secret"), Some("user:*"))
            .await
            .unwrap()
            .deleted;
        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn test_resolved_services_share_one_cache() {
        let calls = Arc::new(AtomicU32::new(0));
        let module = AppModuleBuilder::new(offline_config())
            .with_news_provider(Box::new(CountingNews {
                calls: Arc::clone(&calls),
            }))
            .build()
            .unwrap();

        module.news_service().fetch_news(NewsQuery::default()).await.unwrap();
        module.news_service().fetch_news(NewsQuery::default()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(module.fallback().len(), 1);

        let deleted = module
            .cache_admin()
            .invalidate(Some("secret"), None)
            .await
            .unwrap()
            .deleted;
        assert_eq!(deleted, 1);
        assert!(module.fallback().is_empty());
    }
}
