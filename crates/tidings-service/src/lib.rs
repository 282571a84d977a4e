//! # Tidings Service
//!
//! Service layer for Tidings: the resilient cache, upstream API clients,
//! and the cached news, podcast, and profile services built on them.

pub mod audio;
pub mod cache;
pub mod cache_admin_service;
pub mod cache_aside;
pub mod dto;
pub mod metrics;
pub mod news_service;
pub mod podcast_service;
pub mod profile_cache;
pub mod upstream;

pub use cache::*;
pub use cache_admin_service::*;
pub use cache_aside::{CacheAside, FetchPolicy};
pub use dto::*;
pub use metrics::register_metrics;
pub use news_service::*;
pub use podcast_service::*;
pub use profile_cache::ProfileCache;
pub use upstream::{NewsApiClient, NewsProvider, PodcastApiClient, PodcastProvider};
