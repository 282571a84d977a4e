//! End-to-end tests for the REST surface, driven through the router.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tidings_config::ServerConfig;
use tidings_core::{NormalizedUpstreamError, TidingsResult};
use tidings_resilience::RetryPolicy;
use tidings_rest::{create_router, AppState};
use tidings_service::{
    CacheAdminServiceComponent, EpisodeListResponse, EpisodeRequest, FetchPolicy, MemoryCacheStore,
    NewsProvider, NewsRequest, NewsResponse, NewsServiceComponent, Podcast, PodcastListResponse,
    PodcastProvider, PodcastRequest, PodcastServiceComponent, PodcastTtls, ResilientCache,
};
use tower::ServiceExt;

const SECRET: &str = "let-me-in";
const TTL: Duration = Duration::from_secs(60);

/// News provider returning canned articles, or a rate-limit error for the
/// `throttled` category.
struct StubNews {
    calls: AtomicU32,
}

#[async_trait]
impl NewsProvider for StubNews {
    async fn fetch_articles(&self, request: &NewsRequest) -> TidingsResult<NewsResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.category.as_deref() == Some("throttled") {
            return Err(NormalizedUpstreamError::from_payload(200, Some("rateLimited"), None).into());
        }
        Ok(NewsResponse {
            total_results: 0,
            articles: Vec::new(),
        })
    }
}

struct StubPodcasts;

#[async_trait]
impl PodcastProvider for StubPodcasts {
    async fn list_podcasts(&self, request: &PodcastRequest) -> TidingsResult<PodcastListResponse> {
        Ok(PodcastListResponse {
            podcasts: Vec::new(),
            total: 0,
            page: request.page,
            page_size: request.page_size,
        })
    }

    async fn get_podcast(&self, id: &str) -> TidingsResult<Podcast> {
        Err(NormalizedUpstreamError::from_status(404, format!("no podcast {}", id)).into())
    }

    async fn list_episodes(&self, _id: &str, request: &EpisodeRequest) -> TidingsResult<EpisodeListResponse> {
        Ok(EpisodeListResponse {
            episodes: Vec::new(),
            total: 0,
            page: request.page,
            page_size: request.page_size,
        })
    }
}

struct TestApp {
    router: Router,
    primary: Arc<MemoryCacheStore>,
    news: Arc<StubNews>,
}

fn app() -> TestApp {
    let primary = Arc::new(MemoryCacheStore::new(100));
    let cache = ResilientCache::new(primary.clone(), Arc::new(MemoryCacheStore::new(100)));
    let fetch = FetchPolicy {
        retry: RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(5),
            backoff_factor: 1.0,
        },
        attempt_timeout: Duration::from_secs(1),
    };
    let layer = Arc::new(cache.clone());

    let news = Arc::new(StubNews {
        calls: AtomicU32::new(0),
    });
    let news_service = NewsServiceComponent::new(news.clone(), layer.clone(), fetch.clone(), TTL);
    let podcast_service = PodcastServiceComponent::new(
        Arc::new(StubPodcasts),
        layer.clone(),
        fetch,
        PodcastTtls {
            podcasts: TTL,
            episodes: TTL,
        },
    );
    let cache_admin = CacheAdminServiceComponent::new(layer, Some(SECRET.to_string()));

    let state = AppState::new(
        Arc::new(news_service),
        Arc::new(podcast_service),
        Arc::new(cache_admin),
        cache,
    );

    TestApp {
        router: create_router(state, &ServerConfig::default()),
        primary,
        news,
    }
}

fn seed(primary: &MemoryCacheStore) {
    primary.set("news:technology:en:1:10:none:publishedat", "{}", TTL);
    primary.set("news:all:en:1:10:rust:publishedat", "{}", TTL);
    primary.set("podcasts:all:1:12:popular", "{}", TTL);
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn invalidate(key: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/news/invalidate")
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header("x-cache-invalidation-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_invalidation_without_valid_key_is_rejected() {
    let app = app();
    seed(&app.primary);

    for key in [None, Some("wrong"), Some("")] {
        let (status, body) = send(&app.router, invalidate(key, "")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["code"], json!("UNAUTHORIZED"));
    }
    assert_eq!(app.primary.len(), 3);
}

#[tokio::test]
async fn test_invalidation_with_key_removes_only_news() {
    let app = app();
    seed(&app.primary);

    let (status, body) = send(&app.router, invalidate(Some(SECRET), "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"pattern": "news:*", "deleted": 2}));
    assert_eq!(app.primary.len(), 1);
    assert!(app.primary.get("podcasts:all:1:12:popular").is_some());
}

#[tokio::test]
async fn test_invalidation_with_explicit_pattern() {
    let app = app();
    seed(&app.primary);

    let (status, body) = send(&app.router, invalidate(Some(SECRET), r#"{"pattern":"podcasts:*"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], json!(1));
    assert_eq!(app.primary.len(), 2);
}

#[tokio::test]
async fn test_invalid_pattern_or_body_is_bad_request() {
    let app = app();
    seed(&app.primary);

    for body in [r#"{"pattern":"news:*:page"}"#, r#"{"pattern":""}"#, "{not json"] {
        let (status, response) = send(&app.router, invalidate(Some(SECRET), body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(response["error"]["code"], json!("VALIDATION_ERROR"));
    }
    assert_eq!(app.primary.len(), 3);
}

#[tokio::test]
async fn test_news_is_served_from_cache_on_repeat() {
    let app = app();

    let (status, body) = send(&app.router, get("/api/v1/news?category=technology")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["totalResults"], json!(0));

    let (status, _) = send(&app.router, get("/api/v1/news?page=1&category=Technology")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.news.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_query_is_bad_request() {
    let app = app();

    let (status, body) = send(&app.router, get("/api/v1/news?pageSize=500")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], json!("page_size"));

    let (status, _) = send(&app.router, get("/api/v1/news?page=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.news.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upstream_rate_limit_is_reported() {
    let app = app();

    let (status, body) = send(&app.router, get("/api/v1/news?category=throttled")).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], json!("UPSTREAM_RATE_LIMITED"));
    assert_eq!(body["error"]["retryable"], json!(true));
    assert_eq!(app.news.calls.load(Ordering::SeqCst), 2);
    assert!(app.primary.is_empty());
}

#[tokio::test]
async fn test_podcast_routes() {
    let app = app();

    let (status, body) = send(&app.router, get("/api/v1/podcasts?sort=trending")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pageSize"], json!(12));

    let (status, body) = send(&app.router, get("/api/v1/podcasts/tech-talks/episodes?pageSize=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pageSize"], json!(5));

    let (status, body) = send(&app.router, get("/api/v1/podcasts/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("UPSTREAM_NOT_FOUND"));
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = app();

    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));

    let (status, body) = send(&app.router, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"], json!("primary"));

    let (status, _) = send(&app.router, get("/live")).await;
    assert_eq!(status, StatusCode::OK);
}
