//! Podcast DTOs.

use super::news_dto::{non_blank, DEFAULT_PAGE};
use crate::cache::cache_keys::{PODCASTS_DOMAIN, PODCAST_DOMAIN};
use crate::cache::CacheKey;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Default podcast listing page size.
pub const DEFAULT_PODCAST_PAGE_SIZE: u32 = 12;
/// Default episode listing page size.
pub const DEFAULT_EPISODE_PAGE_SIZE: u32 = 10;
/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Podcast listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PodcastSort {
    #[default]
    Popular,
    New,
    Trending,
}

impl PodcastSort {
    /// Value sent upstream and used in cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Popular => "popular",
            Self::New => "new",
            Self::Trending => "trending",
        }
    }
}

/// Supported episode audio formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Aac,
    M4a,
    Ogg,
}

impl AudioFormat {
    /// Every supported format.
    pub const ALL: [Self; 5] = [Self::Mp3, Self::Wav, Self::Aac, Self::M4a, Self::Ogg];

    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Aac => "aac",
            Self::M4a => "m4a",
            Self::Ogg => "ogg",
        }
    }

    /// Parses a file extension, ignoring case.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(ext))
    }
}

/// Query for podcast listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PodcastQuery {
    /// Listing order.
    pub sort: Option<PodcastSort>,

    /// Category filter.
    #[validate(length(max = 64))]
    pub category: Option<String>,

    /// Page number, starting at 1.
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,

    /// Podcasts per page.
    #[validate(range(min = 1, max = 100, message = "Page size must be 1-100"))]
    pub page_size: Option<u32>,
}

impl PodcastQuery {
    /// Applies defaults and normalizes blank values.
    #[must_use]
    pub fn resolve(&self) -> PodcastRequest {
        PodcastRequest {
            sort: self.sort.unwrap_or_default(),
            category: non_blank(self.category.as_deref()),
            page: self.page.unwrap_or(DEFAULT_PAGE).max(1),
            page_size: self
                .page_size
                .unwrap_or(DEFAULT_PODCAST_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// A podcast listing query with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodcastRequest {
    pub sort: PodcastSort,
    pub category: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl PodcastRequest {
    /// Cache key for this listing.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(PODCASTS_DOMAIN)
            .param("sort", self.sort.as_str())
            .filter("category", self.category.as_deref())
            .param("page", self.page)
            .param("page_size", self.page_size)
    }
}

/// Query for a podcast's episodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EpisodeQuery {
    /// Page number, starting at 1.
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,

    /// Episodes per page.
    #[validate(range(min = 1, max = 100, message = "Page size must be 1-100"))]
    pub page_size: Option<u32>,

    /// Text matched against episode titles and descriptions.
    #[validate(length(max = 200))]
    pub search: Option<String>,
}

impl EpisodeQuery {
    /// Applies defaults and normalizes blank values.
    #[must_use]
    pub fn resolve(&self) -> EpisodeRequest {
        EpisodeRequest {
            page: self.page.unwrap_or(DEFAULT_PAGE).max(1),
            page_size: self
                .page_size
                .unwrap_or(DEFAULT_EPISODE_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            search: non_blank(self.search.as_deref()),
        }
    }
}

/// An episode query with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRequest {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
}

impl EpisodeRequest {
    /// Cache key for `podcast_id`'s episodes.
    #[must_use]
    pub fn cache_key(&self, podcast_id: &str) -> CacheKey {
        CacheKey::new(PODCAST_DOMAIN)
            .scoped(podcast_id)
            .scoped("episodes")
            .param("page", self.page)
            .param("page_size", self.page_size)
            .text("search", self.search.as_deref())
    }
}

/// Cache key for a single podcast.
#[must_use]
pub fn podcast_key(podcast_id: &str) -> CacheKey {
    CacheKey::new(PODCAST_DOMAIN).scoped(podcast_id)
}

/// A podcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Podcast {
    pub id: String,
    pub title: String,
    pub author: String,
    pub image: String,
    pub category: String,
    pub description: String,
    pub episodes: u32,
    pub duration: String,
    pub subscribers: String,
    pub rating: f32,
}

/// A podcast episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub duration: String,
    pub audio_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<AudioFormat>,
}

/// A page of podcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodcastListResponse {
    pub podcasts: Vec<Podcast>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// A page of episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeListResponse {
    pub episodes: Vec<Episode>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}
