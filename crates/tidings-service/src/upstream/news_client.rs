//! News API client.

use super::http::{build_client, read_json, transport_error, API_KEY_HEADER};
use crate::dto::{NewsEndpoint, NewsRequest, NewsResponse};
use async_trait::async_trait;
use reqwest::Client;
use shaku::Component;
use tidings_config::NewsApiConfig;
use tidings_core::{Interface, TidingsResult};
use tracing::debug;

/// Source of news articles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsProvider: Interface + Send + Sync {
    /// Fetches one page of articles.
    async fn fetch_articles(&self, request: &NewsRequest) -> TidingsResult<NewsResponse>;
}

/// HTTP client for the news API.
#[derive(Component)]
#[shaku(interface = NewsProvider)]
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    country: String,
}

impl NewsApiClient {
    /// Creates a client from configuration.
    pub fn new(config: &NewsApiConfig) -> TidingsResult<Self> {
        Ok(Self::with_client(build_client(config.timeout())?, config))
    }

    /// Component parameters for `config`.
    pub fn parameters(config: &NewsApiConfig) -> TidingsResult<NewsApiClientParameters> {
        let client = Self::new(config)?;
        Ok(NewsApiClientParameters {
            client: client.client,
            base_url: client.base_url,
            api_key: client.api_key,
            country: client.country,
        })
    }

    /// Creates a client using an existing HTTP client.
    #[must_use]
    pub fn with_client(client: Client, config: &NewsApiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            country: config.country.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn query_params(&self, request: &NewsRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", request.page.to_string()),
            ("pageSize", request.page_size.to_string()),
        ];

        match request.endpoint() {
            NewsEndpoint::Everything => {
                if let Some(q) = &request.q {
                    params.push(("q", q.clone()));
                }
                params.push(("language", request.language.clone()));
                params.push(("sortBy", request.sort_by.as_str().to_string()));
            }
            NewsEndpoint::TopHeadlines => {
                params.push(("country", self.country.clone()));
                if let Some(category) = &request.category {
                    params.push(("category", category.clone()));
                }
                if let Some(q) = &request.q {
                    params.push(("q", q.clone()));
                }
            }
        }

        params
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn fetch_articles(&self, request: &NewsRequest) -> TidingsResult<NewsResponse> {
        let endpoint = request.endpoint();
        debug!("News API {}: page {}", endpoint.path(), request.page);

        let response = self
            .client
            .get(self.url(endpoint.path()))
            .header(API_KEY_HEADER, &self.api_key)
            .query(&self.query_params(request))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        read_json(response).await
    }
}
