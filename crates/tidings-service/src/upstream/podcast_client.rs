//! Podcast API client.

use super::http::{build_client, read_json, transport_error, API_KEY_HEADER};
use crate::dto::{EpisodeListResponse, EpisodeRequest, Podcast, PodcastListResponse, PodcastRequest};
use async_trait::async_trait;
use reqwest::Client;
use shaku::Component;
use tidings_config::PodcastApiConfig;
use tidings_core::{Interface, TidingsResult};
use tracing::debug;

/// Source of podcasts and episodes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PodcastProvider: Interface + Send + Sync {
    /// Fetches one page of podcasts.
    async fn list_podcasts(&self, request: &PodcastRequest) -> TidingsResult<PodcastListResponse>;

    /// Fetches a single podcast.
    async fn get_podcast(&self, id: &str) -> TidingsResult<Podcast>;

    /// Fetches one page of a podcast's episodes.
    async fn list_episodes(&self, id: &str, request: &EpisodeRequest) -> TidingsResult<EpisodeListResponse>;
}

/// HTTP client for the podcast API.
#[derive(Component)]
#[shaku(interface = PodcastProvider)]
pub struct PodcastApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PodcastApiClient {
    /// Creates a client from configuration.
    pub fn new(config: &PodcastApiConfig) -> TidingsResult<Self> {
        Ok(Self::with_client(build_client(config.timeout())?, config))
    }

    /// Component parameters for `config`.
    pub fn parameters(config: &PodcastApiConfig) -> TidingsResult<PodcastApiClientParameters> {
        let client = Self::new(config)?;
        Ok(PodcastApiClientParameters {
            client: client.client,
            base_url: client.base_url,
            api_key: client.api_key,
        })
    }

    /// Creates a client using an existing HTTP client.
    #[must_use]
    pub fn with_client(client: Client, config: &PodcastApiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Builds a URL from already-encoded path segments.
    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(segment);
        }
        url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        params: &[(&str, String)],
    ) -> TidingsResult<T> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(params)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        read_json(response).await
    }
}

/// Percent-encodes a path segment so ids cannot alter the request path.
fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[async_trait]
impl PodcastProvider for PodcastApiClient {
    async fn list_podcasts(&self, request: &PodcastRequest) -> TidingsResult<PodcastListResponse> {
        debug!("Podcast API list: sort={} page={}", request.sort.as_str(), request.page);

        let mut params = vec![
            ("sort", request.sort.as_str().to_string()),
            ("page", request.page.to_string()),
            ("pageSize", request.page_size.to_string()),
        ];
        if let Some(category) = &request.category {
            params.push(("category", category.clone()));
        }

        self.get_json(self.url(&["podcasts"]), &params).await
    }

    async fn get_podcast(&self, id: &str) -> TidingsResult<Podcast> {
        debug!("Podcast API get: {}", id);
        self.get_json(self.url(&["podcasts", &encode_segment(id)]), &[]).await
    }

    async fn list_episodes(&self, id: &str, request: &EpisodeRequest) -> TidingsResult<EpisodeListResponse> {
        debug!("Podcast API episodes: {} page={}", id, request.page);

        let mut params = vec![
            ("page", request.page.to_string()),
            ("pageSize", request.page_size.to_string()),
        ];
        if let Some(search) = &request.search {
            params.push(("search", search.clone()));
        }

        self.get_json(self.url(&["podcasts", &encode_segment(id), "episodes"]), &params)
            .await
    }
}
