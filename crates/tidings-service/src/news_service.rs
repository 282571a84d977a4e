//! News service.

use crate::cache::CacheLayer;
use crate::cache_aside::{CacheAside, FetchPolicy};
use crate::dto::{NewsQuery, NewsResponse};
use crate::upstream::NewsProvider;
use async_trait::async_trait;
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use tidings_core::{Interface, TidingsResult};
use tracing::instrument;

/// Default lifetime of cached news listings.
pub const DEFAULT_NEWS_TTL: Duration = Duration::from_secs(15 * 60);

/// Cached access to news listings and searches.
#[async_trait]
pub trait NewsService: Interface + Send + Sync {
    /// Fetches news for `query`, serving from cache when possible.
    async fn fetch_news(&self, query: NewsQuery) -> TidingsResult<NewsResponse>;

    /// Searches news by free text.
    async fn search_news(
        &self,
        q: &str,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> TidingsResult<NewsResponse>;
}

/// News service component.
#[derive(Component)]
#[shaku(interface = NewsService)]
pub struct NewsServiceComponent {
    #[shaku(inject)]
    provider: Arc<dyn NewsProvider>,
    #[shaku(inject)]
    cache: Arc<dyn CacheLayer>,
    fetch: FetchPolicy,
    #[shaku(default = DEFAULT_NEWS_TTL)]
    ttl: Duration,
}

impl NewsServiceComponent {
    /// Creates a service outside a module.
    #[must_use]
    pub fn new(
        provider: Arc<dyn NewsProvider>,
        cache: Arc<dyn CacheLayer>,
        fetch: FetchPolicy,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            fetch,
            ttl,
        }
    }

    fn fetcher(&self) -> CacheAside {
        CacheAside::with_policy(self.cache.cache(), &self.fetch, "news")
    }
}

#[async_trait]
impl NewsService for NewsServiceComponent {
    #[instrument(skip(self, query), fields(category = ?query.category, q = ?query.q))]
    async fn fetch_news(&self, query: NewsQuery) -> TidingsResult<NewsResponse> {
        let request = query.resolve();
        let key = request.cache_key();

        self.fetcher()
            .get_or_fetch(&key, self.ttl, || self.provider.fetch_articles(&request))
            .await
    }

    async fn search_news(
        &self,
        q: &str,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> TidingsResult<NewsResponse> {
        self.fetch_news(NewsQuery {
            q: Some(q.to_string()),
            page,
            page_size,
            ..Default::default()
        })
        .await
    }
}
