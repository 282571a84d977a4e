//! Application state for Axum handlers.

use std::sync::Arc;
use tidings_service::{CacheAdminService, NewsService, PodcastService, ResilientCache};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub news_service: Arc<dyn NewsService>,
    pub podcast_service: Arc<dyn PodcastService>,
    pub cache_admin: Arc<dyn CacheAdminService>,
    pub cache: ResilientCache,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        news_service: Arc<dyn NewsService>,
        podcast_service: Arc<dyn PodcastService>,
        cache_admin: Arc<dyn CacheAdminService>,
        cache: ResilientCache,
    ) -> Self {
        Self {
            news_service,
            podcast_service,
            cache_admin,
            cache,
        }
    }
}
