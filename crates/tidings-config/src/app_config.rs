//! Application configuration structures.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis (distributed cache) configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Cache TTLs and fallback store configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Retry policy for upstream calls.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Third-party API configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Administrative operations.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "tidings".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Enable CORS.
    pub cors_enabled: bool,
    /// CORS allowed origins.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_secs: 60,
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    /// Returns the server address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the request timeout as a Duration.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Redis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis host.
    pub host: String,
    /// Redis port.
    pub port: u16,
    /// Full connection URL; takes precedence over host/port when set.
    pub url: Option<String>,
    /// Connection pool size.
    pub pool_size: usize,
    /// Enable Redis. When disabled every request is served by the fallback store.
    pub enabled: bool,
    /// Timeout for establishing a connection, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Consecutive connection failures tolerated before giving up until restart.
    pub max_reconnect_attempts: u32,
    /// Reconnect delay step in milliseconds (multiplied by the failure count).
    pub reconnect_delay_ms: u64,
    /// Upper bound for the reconnect delay in milliseconds.
    pub max_reconnect_delay_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            url: None,
            pool_size: 10,
            enabled: true,
            connect_timeout_ms: 1000,
            max_reconnect_attempts: 5,
            reconnect_delay_ms: 500,
            max_reconnect_delay_ms: 2000,
        }
    }
}

impl RedisConfig {
    /// Returns the connection URL.
    #[must_use]
    pub fn connection_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("redis://{}:{}", self.host, self.port))
    }

    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the reconnect delay step as a Duration.
    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Returns the reconnect delay ceiling as a Duration.
    #[must_use]
    pub const fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }
}

/// Cache configuration: per-domain TTLs and the in-process fallback store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for news listings in seconds.
    pub news_ttl_secs: u64,
    /// TTL for podcast listings and details in seconds.
    pub podcasts_ttl_secs: u64,
    /// TTL for podcast episode listings in seconds.
    pub episodes_ttl_secs: u64,
    /// TTL for user profiles in seconds.
    pub profile_ttl_secs: u64,
    /// Interval between fallback store sweeps in seconds.
    pub fallback_sweep_interval_secs: u64,
    /// Maximum number of entries held by the fallback store.
    pub fallback_max_entries: usize,
    /// Interval for invalidating all news entries in seconds (0 disables it).
    pub stale_news_invalidation_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            news_ttl_secs: 900,
            podcasts_ttl_secs: 3600,
            episodes_ttl_secs: 900,
            profile_ttl_secs: 7200,
            fallback_sweep_interval_secs: 60,
            fallback_max_entries: 10_000,
            stale_news_invalidation_secs: 900,
        }
    }
}

impl CacheConfig {
    /// Returns the news TTL.
    #[must_use]
    pub const fn news_ttl(&self) -> Duration {
        Duration::from_secs(self.news_ttl_secs)
    }

    /// Returns the podcast TTL.
    #[must_use]
    pub const fn podcasts_ttl(&self) -> Duration {
        Duration::from_secs(self.podcasts_ttl_secs)
    }

    /// Returns the podcast episode TTL.
    #[must_use]
    pub const fn episodes_ttl(&self) -> Duration {
        Duration::from_secs(self.episodes_ttl_secs)
    }

    /// Returns the user profile TTL.
    #[must_use]
    pub const fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }

    /// Returns the fallback sweep interval.
    #[must_use]
    pub const fn fallback_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.fallback_sweep_interval_secs)
    }

    /// Returns the stale news invalidation interval, if enabled.
    #[must_use]
    pub const fn stale_news_invalidation(&self) -> Option<Duration> {
        if self.stale_news_invalidation_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.stale_news_invalidation_secs))
        }
    }
}

/// Retry configuration for upstream calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between attempts in milliseconds.
    pub max_delay_ms: u64,
    /// Backoff multiplier.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 5000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Returns the initial delay as a Duration.
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Returns the maximum delay as a Duration.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Third-party API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// News API.
    pub news: NewsApiConfig,
    /// Podcast API.
    pub podcasts: PodcastApiConfig,
}

/// News API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsApiConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// API key.
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Country used for headline listings.
    pub country: String,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
            country: "us".to_string(),
        }
    }
}

impl NewsApiConfig {
    /// Returns the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Podcast API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PodcastApiConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// API key.
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PodcastApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.podcasts.example.com/v1".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

impl PodcastApiConfig {
    /// Returns the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Administrative configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared secret for the cache invalidation endpoint.
    /// When unset, every invalidation request is rejected.
    pub invalidation_key: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}
