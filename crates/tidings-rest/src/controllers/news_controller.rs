//! News controller.

use crate::{
    extractors::ValidatedQuery,
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tidings_core::TidingsError;
use tidings_service::{InvalidationResult, NewsQuery, NewsResponse, NewsSearchQuery};
use tracing::debug;
use utoipa::ToSchema;

/// Header carrying the cache invalidation secret.
pub const INVALIDATION_KEY_HEADER: &str = "x-cache-invalidation-key";

/// Body of an invalidation request.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InvalidateRequest {
    /// Key pattern with at most one trailing `*` (default `news:*`).
    pub pattern: Option<String>,
}

/// Creates the news router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_news))
        .route("/search", get(search_news))
        .route("/invalidate", post(invalidate_cache))
}

/// List news articles.
#[utoipa::path(
    get,
    path = "/news",
    tag = "news",
    params(NewsQuery),
    responses(
        (status = 200, description = "A page of articles", body = NewsResponse),
        (status = 400, description = "Invalid query"),
        (status = 429, description = "Upstream rate limit reached"),
        (status = 503, description = "Upstream unavailable")
    )
)]
pub async fn list_news(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<NewsQuery>,
) -> ApiResult<NewsResponse> {
    debug!("List news request: {:?}", query);
    ok(state.news_service.fetch_news(query).await?)
}

/// Search news articles.
#[utoipa::path(
    get,
    path = "/news/search",
    tag = "news",
    params(NewsSearchQuery),
    responses(
        (status = 200, description = "Matching articles", body = NewsResponse),
        (status = 400, description = "Invalid query")
    )
)]
pub async fn search_news(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<NewsSearchQuery>,
) -> ApiResult<NewsResponse> {
    if query.q.trim().is_empty() {
        return Err(TidingsError::validation("Search query must not be blank").into());
    }
    debug!("Search news request: {}", query.q);

    let response = state
        .news_service
        .search_news(&query.q, query.page, query.page_size)
        .await?;
    ok(response)
}

/// Invalidate cached entries.
///
/// Requires the shared secret in the `x-cache-invalidation-key` header.
/// An empty body invalidates every news entry.
#[utoipa::path(
    post,
    path = "/news/invalidate",
    tag = "cache",
    request_body(content = InvalidateRequest, description = "Pattern to invalidate"),
    params(
        ("x-cache-invalidation-key" = String, Header, description = "Cache invalidation secret")
    ),
    responses(
        (status = 200, description = "Entries removed", body = InvalidationResult),
        (status = 400, description = "Malformed body or pattern"),
        (status = 401, description = "Missing or incorrect invalidation key")
    )
)]
pub async fn invalidate_cache(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<InvalidationResult> {
    let credential = headers
        .get(INVALIDATION_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    state.cache_admin.authorize(credential)?;
    let request = parse_invalidate_body(&body)?;

    let result = state
        .cache_admin
        .invalidate(credential, request.pattern.as_deref())
        .await?;
    ok(result)
}

fn parse_invalidate_body(body: &[u8]) -> Result<InvalidateRequest, TidingsError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(InvalidateRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| TidingsError::validation(format!("Invalid request body: {}", e)))
}
