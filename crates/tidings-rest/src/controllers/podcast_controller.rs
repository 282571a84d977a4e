//! Podcast controller.

use crate::{
    extractors::ValidatedQuery,
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use tidings_service::{EpisodeListResponse, EpisodeQuery, Podcast, PodcastListResponse, PodcastQuery};
use tracing::debug;

/// Creates the podcast router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_podcasts))
        .route("/:id", get(get_podcast))
        .route("/:id/episodes", get(list_episodes))
}

/// List podcasts.
#[utoipa::path(
    get,
    path = "/podcasts",
    tag = "podcasts",
    params(PodcastQuery),
    responses(
        (status = 200, description = "A page of podcasts", body = PodcastListResponse),
        (status = 400, description = "Invalid query")
    )
)]
pub async fn list_podcasts(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PodcastQuery>,
) -> ApiResult<PodcastListResponse> {
    debug!("List podcasts request: {:?}", query);
    ok(state.podcast_service.list_podcasts(query).await?)
}

/// Get a podcast by id.
#[utoipa::path(
    get,
    path = "/podcasts/{id}",
    tag = "podcasts",
    params(("id" = String, Path, description = "Podcast id")),
    responses(
        (status = 200, description = "The podcast", body = Podcast),
        (status = 404, description = "Podcast not found")
    )
)]
pub async fn get_podcast(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Podcast> {
    debug!("Get podcast request: {}", id);
    ok(state.podcast_service.get_podcast(&id).await?)
}

/// List a podcast's episodes.
#[utoipa::path(
    get,
    path = "/podcasts/{id}/episodes",
    tag = "podcasts",
    params(("id" = String, Path, description = "Podcast id"), EpisodeQuery),
    responses(
        (status = 200, description = "A page of episodes", body = EpisodeListResponse),
        (status = 404, description = "Podcast not found")
    )
)]
pub async fn list_episodes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<EpisodeQuery>,
) -> ApiResult<EpisodeListResponse> {
    debug!("List episodes request: {}", id);
    ok(state.podcast_service.list_episodes(&id, query).await?)
}
