//! Upstream behavior against mocked news and podcast APIs.

mod common;

use common::{fetch_policy, memory_cache};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tidings_config::{NewsApiConfig, PodcastApiConfig};
use tidings_core::{TidingsError, UpstreamErrorKind};
use tidings_service::{
    EpisodeQuery, NewsApiClient, NewsQuery, NewsService, NewsServiceComponent, PodcastApiClient,
    PodcastService, PodcastServiceComponent, PodcastTtls,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn articles_body() -> serde_json::Value {
    json!({
        "status": "ok",
        "totalResults": 1,
        "articles": [{
            "source": {"id": null, "name": "Wire"},
            "author": "Reporter",
            "title": "Rust 2.0 announced",
            "description": null,
            "url": "https://news.example.com/rust",
            "urlToImage": null,
            "publishedAt": "2024-02-20T10:00:00Z",
            "content": null
        }]
    })
}

async fn news_service(server: &MockServer) -> (NewsServiceComponent, Arc<tidings_service::MemoryCacheStore>) {
    let config = NewsApiConfig {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        ..Default::default()
    };
    let client = NewsApiClient::new(&config).expect("client");
    let (cache, primary) = memory_cache();
    let service = NewsServiceComponent::new(
        Arc::new(client),
        Arc::new(cache),
        fetch_policy(),
        Duration::from_secs(900),
    );
    (service, primary)
}

fn technology() -> NewsQuery {
    NewsQuery {
        category: Some("technology".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_headlines_are_fetched_with_api_key_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .and(header("X-Api-Key", "test-key"))
        .and(query_param("category", "technology"))
        .and(query_param("country", "us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (service, primary) = news_service(&server).await;

    let first = service.fetch_news(technology()).await.unwrap();
    let second = service.fetch_news(technology()).await.unwrap();

    assert_eq!(first.articles[0].title, "Rust 2.0 announced");
    assert_eq!(first, second);
    assert_eq!(primary.len(), 1);
}

#[tokio::test]
async fn test_semantic_error_is_classified_and_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (service, primary) = news_service(&server).await;

    let err = service.fetch_news(technology()).await.unwrap_err();
    let upstream = err.as_upstream().expect("upstream error");
    assert_eq!(upstream.kind, UpstreamErrorKind::Unauthorized);
    assert!(!upstream.retryable);
    assert!(primary.is_empty());
}

#[tokio::test]
async fn test_rate_limit_payload_is_retried_up_to_the_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "code": "rateLimited",
            "message": "You have made too many requests."
        })))
        .expect(3)
        .mount(&server)
        .await;

    let (service, primary) = news_service(&server).await;

    let err = service.fetch_news(technology()).await.unwrap_err();
    assert_eq!(err.status_code(), 429);
    assert!(primary.is_empty());
}

#[tokio::test]
async fn test_unavailable_upstream_recovers_on_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .and(query_param("q", "rust"))
        .and(query_param("sortBy", "publishedAt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (service, primary) = news_service(&server).await;

    let result = service.search_news("rust", None, None).await.unwrap();
    assert_eq!(result.total_results, 1);
    assert_eq!(primary.len(), 1);
}

#[tokio::test]
async fn test_bad_request_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "error",
            "code": "parameterInvalid",
            "message": "pageSize is out of range"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (service, _) = news_service(&server).await;

    let err = service.fetch_news(technology()).await.unwrap_err();
    assert!(matches!(err, TidingsError::Upstream(_)));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_undecodable_body_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let (service, primary) = news_service(&server).await;

    let err = service.fetch_news(technology()).await.unwrap_err();
    assert_eq!(err.as_upstream().map(|e| e.kind), Some(UpstreamErrorKind::Unknown));
    assert!(primary.is_empty());
}

#[tokio::test]
async fn test_podcast_episodes_are_normalized_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/podcasts/tech-talks/episodes"))
        .and(header("X-Api-Key", "podcast-key"))
        .and(query_param("page", "1"))
        .and(query_param("pageSize", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "episodes": [
                {
                    "id": "e1",
                    "title": "The Future of AI",
                    "description": "Where AI is heading",
                    "date": "2024-02-20",
                    "duration": "45:30",
                    "audioUrl": "https://cdn.example.com/tech-talks/e1",
                    "format": "wav"
                },
                {
                    "id": "e2",
                    "title": "Quantum Basics",
                    "description": "Qubits explained",
                    "date": "2024-02-13",
                    "duration": "38:15",
                    "audioUrl": "https://cdn.example.com/tech-talks/e2.ogg?sig=abc"
                }
            ],
            "total": 2,
            "page": 1,
            "pageSize": 10
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = PodcastApiConfig {
        base_url: server.uri(),
        api_key: "podcast-key".to_string(),
        ..Default::default()
    };
    let client = PodcastApiClient::new(&config).expect("client");
    let (cache, primary) = memory_cache();
    let service = PodcastServiceComponent::new(
        Arc::new(client),
        Arc::new(cache),
        fetch_policy(),
        PodcastTtls::default(),
    );

    let first = service
        .list_episodes("tech-talks", EpisodeQuery::default())
        .await
        .unwrap();
    let second = service
        .list_episodes("tech-talks", EpisodeQuery::default())
        .await
        .unwrap();

    assert_eq!(first.episodes[0].audio_url, "https://cdn.example.com/tech-talks/e1.wav");
    assert_eq!(first.episodes[1].audio_url, "https://cdn.example.com/tech-talks/e2.ogg?sig=abc");
    assert_eq!(first, second);
    assert!(primary.get("podcast:tech-talks:episodes:1:10:none").is_some());
}

#[tokio::test]
async fn test_missing_podcast_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/podcasts/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = PodcastApiConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    let client = PodcastApiClient::new(&config).expect("client");
    let (cache, _) = memory_cache();
    let service = PodcastServiceComponent::new(
        Arc::new(client),
        Arc::new(cache),
        fetch_policy(),
        PodcastTtls::default(),
    );

    let err = service.get_podcast("ghost").await.unwrap_err();
    assert_eq!(err.status_code(), 404);
}
