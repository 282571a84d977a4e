//! News DTOs.

use crate::cache::cache_keys::NEWS_DOMAIN;
use crate::cache::CacheKey;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Default page.
pub const DEFAULT_PAGE: u32 = 1;
/// Default news page size.
pub const DEFAULT_NEWS_PAGE_SIZE: u32 = 10;
/// Largest page size the news API accepts.
pub const MAX_NEWS_PAGE_SIZE: u32 = 100;
/// Default article language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Sort order for news searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum NewsSort {
    #[default]
    PublishedAt,
    Relevancy,
    Popularity,
}

impl NewsSort {
    /// Value sent upstream and used in cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PublishedAt => "publishedAt",
            Self::Relevancy => "relevancy",
            Self::Popularity => "popularity",
        }
    }
}

/// Query for news listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NewsQuery {
    /// Category filter (business, technology, ...).
    #[validate(length(max = 64))]
    pub category: Option<String>,

    /// Free-text query.
    #[validate(length(max = 500))]
    pub q: Option<String>,

    /// Page number, starting at 1.
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,

    /// Articles per page (max 100).
    #[validate(range(min = 1, max = 100, message = "Page size must be 1-100"))]
    pub page_size: Option<u32>,

    /// Two-letter language code.
    #[validate(length(min = 2, max = 2, message = "Language must be a two-letter code"))]
    pub language: Option<String>,

    /// Sort order.
    pub sort_by: Option<NewsSort>,
}

impl NewsQuery {
    /// Applies defaults and normalizes blank values.
    #[must_use]
    pub fn resolve(&self) -> NewsRequest {
        NewsRequest {
            category: non_blank(self.category.as_deref()),
            q: non_blank(self.q.as_deref()),
            page: self.page.unwrap_or(DEFAULT_PAGE).max(1),
            page_size: self
                .page_size
                .unwrap_or(DEFAULT_NEWS_PAGE_SIZE)
                .clamp(1, MAX_NEWS_PAGE_SIZE),
            language: non_blank(self.language.as_deref())
                .map_or_else(|| DEFAULT_LANGUAGE.to_string(), |l| l.to_lowercase()),
            sort_by: self.sort_by.unwrap_or_default(),
        }
    }
}

/// Query for news searches.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NewsSearchQuery {
    /// Search text.
    #[validate(length(min = 1, max = 500, message = "Query must be 1-500 characters"))]
    pub q: String,

    /// Page number, starting at 1.
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,

    /// Articles per page (max 100).
    #[validate(range(min = 1, max = 100, message = "Page size must be 1-100"))]
    pub page_size: Option<u32>,
}

/// Upstream news endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsEndpoint {
    /// Full-text search across all articles.
    Everything,
    /// Current headlines, optionally per category.
    TopHeadlines,
}

impl NewsEndpoint {
    /// Request path relative to the API base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Everything => "/everything",
            Self::TopHeadlines => "/top-headlines",
        }
    }
}

/// A news query with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRequest {
    pub category: Option<String>,
    pub q: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub language: String,
    pub sort_by: NewsSort,
}

impl NewsRequest {
    /// A free-text query without a category searches everything; anything
    /// else reads headlines.
    #[must_use]
    pub fn endpoint(&self) -> NewsEndpoint {
        if self.q.is_some() && self.category.is_none() {
            NewsEndpoint::Everything
        } else {
            NewsEndpoint::TopHeadlines
        }
    }

    /// Cache key for this request.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(NEWS_DOMAIN)
            .filter("category", self.category.as_deref())
            .text("q", self.q.as_deref())
            .param("page", self.page)
            .param("page_size", self.page_size)
            .param("language", &self.language)
            .param("sort_by", self.sort_by.as_str())
    }
}

/// Article source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: String,
}

/// A news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: ArticleSource,
    pub author: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub url_to_image: Option<String>,
    pub published_at: String,
    pub content: Option<String>,
}

/// A page of news articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub total_results: u64,
    pub articles: Vec<Article>,
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
