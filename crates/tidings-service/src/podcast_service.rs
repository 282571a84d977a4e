//! Podcast service.

use crate::audio::normalize_episodes;
use crate::cache::CacheLayer;
use crate::cache_aside::{CacheAside, FetchPolicy};
use crate::dto::{
    podcast_key, EpisodeListResponse, EpisodeQuery, Podcast, PodcastListResponse, PodcastQuery,
};
use crate::upstream::PodcastProvider;
use async_trait::async_trait;
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use tidings_core::{Interface, TidingsError, TidingsResult};
use tracing::instrument;

/// Cache lifetimes for podcast data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PodcastTtls {
    /// Listings and single podcasts.
    pub podcasts: Duration,
    /// Episode listings.
    pub episodes: Duration,
}

impl Default for PodcastTtls {
    fn default() -> Self {
        Self {
            podcasts: Duration::from_secs(60 * 60),
            episodes: Duration::from_secs(15 * 60),
        }
    }
}

/// Cached access to podcasts and episodes.
#[async_trait]
pub trait PodcastService: Interface + Send + Sync {
    /// Lists podcasts.
    async fn list_podcasts(&self, query: PodcastQuery) -> TidingsResult<PodcastListResponse>;

    /// Fetches a single podcast.
    async fn get_podcast(&self, id: &str) -> TidingsResult<Podcast>;

    /// Lists a podcast's episodes with normalized audio URLs.
    async fn list_episodes(&self, id: &str, query: EpisodeQuery) -> TidingsResult<EpisodeListResponse>;
}

/// Podcast service component.
#[derive(Component)]
#[shaku(interface = PodcastService)]
pub struct PodcastServiceComponent {
    #[shaku(inject)]
    provider: Arc<dyn PodcastProvider>,
    #[shaku(inject)]
    cache: Arc<dyn CacheLayer>,
    fetch: FetchPolicy,
    ttls: PodcastTtls,
}

impl PodcastServiceComponent {
    /// Creates a service outside a module.
    #[must_use]
    pub fn new(
        provider: Arc<dyn PodcastProvider>,
        cache: Arc<dyn CacheLayer>,
        fetch: FetchPolicy,
        ttls: PodcastTtls,
    ) -> Self {
        Self {
            provider,
            cache,
            fetch,
            ttls,
        }
    }

    fn fetcher(&self) -> CacheAside {
        CacheAside::with_policy(self.cache.cache(), &self.fetch, "podcasts")
    }
}

#[async_trait]
impl PodcastService for PodcastServiceComponent {
    #[instrument(skip(self, query), fields(sort = ?query.sort, category = ?query.category))]
    async fn list_podcasts(&self, query: PodcastQuery) -> TidingsResult<PodcastListResponse> {
        let request = query.resolve();
        let key = request.cache_key();

        self.fetcher()
            .get_or_fetch(&key, self.ttls.podcasts, || self.provider.list_podcasts(&request))
            .await
    }

    #[instrument(skip(self))]
    async fn get_podcast(&self, id: &str) -> TidingsResult<Podcast> {
        let id = validate_id(id)?;

        self.fetcher()
            .get_or_fetch(&podcast_key(id), self.ttls.podcasts, || self.provider.get_podcast(id))
            .await
    }

    #[instrument(skip(self, query))]
    async fn list_episodes(&self, id: &str, query: EpisodeQuery) -> TidingsResult<EpisodeListResponse> {
        let id = validate_id(id)?;
        let request = query.resolve();
        let key = request.cache_key(id);

        self.fetcher()
            .get_or_fetch(&key, self.ttls.episodes, || async {
                let mut response = self.provider.list_episodes(id, &request).await?;
                normalize_episodes(&mut response.episodes);
                Ok(response)
            })
            .await
    }
}

fn validate_id(id: &str) -> TidingsResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(TidingsError::validation("Podcast id must not be empty"));
    }
    Ok(id)
}
