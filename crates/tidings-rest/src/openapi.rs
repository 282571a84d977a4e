//! OpenAPI documentation configuration.

use crate::controllers::news_controller::InvalidateRequest;
use crate::controllers::{HealthResponse, ReadinessResponse};
use tidings_core::{ErrorResponse, FieldError};
use tidings_service::{
    Article, ArticleSource, AudioFormat, Episode, EpisodeListResponse, InvalidationResult,
    NewsResponse, NewsSort, Podcast, PodcastListResponse, PodcastSort,
};
use utoipa::OpenApi;

/// OpenAPI documentation for the Tidings API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tidings API",
        version = "1.0.0",
        description = "Cached news and podcast aggregation API",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        crate::controllers::news_controller::list_news,
        crate::controllers::news_controller::search_news,
        crate::controllers::news_controller::invalidate_cache,
        crate::controllers::podcast_controller::list_podcasts,
        crate::controllers::podcast_controller::get_podcast,
        crate::controllers::podcast_controller::list_episodes,
        crate::controllers::health_controller::health_check,
        crate::controllers::health_controller::readiness_check,
        crate::controllers::health_controller::liveness_check,
    ),
    components(
        schemas(
            ErrorResponse,
            FieldError,
            Article,
            ArticleSource,
            NewsResponse,
            NewsSort,
            Podcast,
            PodcastSort,
            Episode,
            AudioFormat,
            PodcastListResponse,
            EpisodeListResponse,
            InvalidateRequest,
            InvalidationResult,
            HealthResponse,
            ReadinessResponse,
        )
    ),
    tags(
        (name = "news", description = "News endpoints"),
        (name = "podcasts", description = "Podcast endpoints"),
        (name = "cache", description = "Cache administration"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;
