//! Configuration validation module.
//!
//! Collects every invalid value in one pass so startup fails with the full
//! list instead of the first problem.

use crate::AppConfig;
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Port number is invalid (must be 1-65535).
    InvalidPort { name: String, value: u16 },
    /// Pool size is zero or exceeds the maximum allowed.
    InvalidPoolSize { value: usize, maximum: usize },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Duration value must be positive.
    NonPositiveDuration { name: String },
    /// Retry settings are inconsistent.
    InvalidRetry { message: String },
    /// Fallback capacity must be positive.
    InvalidCapacity { name: String },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
    /// Log format is invalid.
    InvalidLogFormat { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPort { name, value } => {
                write!(f, "Invalid port for {}: {} (must be 1-65535)", name, value)
            }
            Self::InvalidPoolSize { value, maximum } => {
                write!(f, "Invalid pool size {} (must be 1-{})", value, maximum)
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::NonPositiveDuration { name } => {
                write!(f, "'{}' must be positive", name)
            }
            Self::InvalidRetry { message } => {
                write!(f, "Invalid retry configuration: {}", message)
            }
            Self::InvalidCapacity { name } => {
                write!(f, "'{}' must be at least 1", name)
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
            Self::InvalidLogFormat { value } => {
                write!(f, "Invalid log format: '{}' (valid: json, pretty)", value)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of configuration validation containing all errors found.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    fn require_positive(&mut self, name: &str, value: u64) {
        if value == 0 {
            self.add_error(ConfigValidationError::NonPositiveDuration {
                name: name.to_string(),
            });
        }
    }

    fn require_http_url(&mut self, url_type: &str, value: &str) {
        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => self.add_error(ConfigValidationError::InvalidUrl {
                url_type: url_type.to_string(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => self.add_error(ConfigValidationError::InvalidUrl {
                url_type: url_type.to_string(),
                message: format!("{}: {}", value, e),
            }),
        }
    }

    fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: usize = 1000;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
    /// Valid log formats.
    const VALID_LOG_FORMATS: &'static [&'static str] = &["json", "pretty"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::default();

        Self::validate_server(&config.server, &mut result);
        Self::validate_redis(&config.redis, &mut result);
        Self::validate_cache(&config.cache, &mut result);
        Self::validate_retry(&config.retry, &mut result);
        Self::validate_upstream(&config.upstream, &mut result);
        Self::validate_observability(&config.observability, &mut result);

        result.into_result()
    }

    fn validate_server(config: &crate::ServerConfig, result: &mut ValidationResult) {
        if config.port == 0 {
            result.add_error(ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: config.port,
            });
        }
        result.require_positive("server.request_timeout_secs", config.request_timeout_secs);
    }

    fn validate_redis(config: &crate::RedisConfig, result: &mut ValidationResult) {
        if !config.enabled {
            return;
        }

        if config.url.is_none() && config.port == 0 {
            result.add_error(ConfigValidationError::InvalidPort {
                name: "redis.port".to_string(),
                value: config.port,
            });
        }

        let url = config.connection_url();
        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: "URL must start with redis:// or rediss://".to_string(),
            });
        }

        if config.pool_size == 0 || config.pool_size > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::InvalidPoolSize {
                value: config.pool_size,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        result.require_positive("redis.connect_timeout_ms", config.connect_timeout_ms);
    }

    fn validate_cache(config: &crate::CacheConfig, result: &mut ValidationResult) {
        result.require_positive("cache.news_ttl_secs", config.news_ttl_secs);
        result.require_positive("cache.podcasts_ttl_secs", config.podcasts_ttl_secs);
        result.require_positive("cache.episodes_ttl_secs", config.episodes_ttl_secs);
        result.require_positive("cache.profile_ttl_secs", config.profile_ttl_secs);
        result.require_positive(
            "cache.fallback_sweep_interval_secs",
            config.fallback_sweep_interval_secs,
        );

        if config.fallback_max_entries == 0 {
            result.add_error(ConfigValidationError::InvalidCapacity {
                name: "cache.fallback_max_entries".to_string(),
            });
        }
    }

    fn validate_retry(config: &crate::RetryConfig, result: &mut ValidationResult) {
        if config.max_attempts == 0 {
            result.add_error(ConfigValidationError::InvalidRetry {
                message: "max_attempts must be at least 1".to_string(),
            });
        }
        if !config.backoff_factor.is_finite() || config.backoff_factor < 1.0 {
            result.add_error(ConfigValidationError::InvalidRetry {
                message: format!("backoff_factor must be >= 1.0, got {}", config.backoff_factor),
            });
        }
        if config.initial_delay_ms > config.max_delay_ms {
            result.add_error(ConfigValidationError::InvalidRetry {
                message: format!(
                    "initial_delay_ms ({}) exceeds max_delay_ms ({})",
                    config.initial_delay_ms, config.max_delay_ms
                ),
            });
        }
    }

    fn validate_upstream(config: &crate::UpstreamConfig, result: &mut ValidationResult) {
        result.require_http_url("upstream.news.base_url", &config.news.base_url);
        result.require_positive("upstream.news.timeout_secs", config.news.timeout_secs);
        result.require_http_url("upstream.podcasts.base_url", &config.podcasts.base_url);
        result.require_positive("upstream.podcasts.timeout_secs", config.podcasts.timeout_secs);
    }

    fn validate_observability(config: &crate::ObservabilityConfig, result: &mut ValidationResult) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }

        let format = config.log_format.to_lowercase();
        if !Self::VALID_LOG_FORMATS.contains(&format.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogFormat {
                value: config.log_format.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigValidator::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.cache.news_ttl_secs = 0;
        config.observability.log_level = "loud".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ConfigValidationError::NonPositiveDuration {
            name: "cache.news_ttl_secs".to_string()
        }));
    }

    #[test]
    fn test_invalid_redis_url() {
        let mut config = AppConfig::default();
        config.redis.url = Some("http://localhost:6379".to_string());

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(errors[0], ConfigValidationError::InvalidUrl { .. }));
    }

    #[test]
    fn test_disabled_redis_skips_checks() {
        let mut config = AppConfig::default();
        config.redis.enabled = false;
        config.redis.pool_size = 0;

        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_retry_consistency() {
        let mut config = AppConfig::default();
        config.retry.backoff_factor = 0.5;
        config.retry.initial_delay_ms = 10_000;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ConfigValidationError::InvalidRetry { .. })));
    }

    #[test]
    fn test_upstream_url_must_be_http() {
        let mut config = AppConfig::default();
        config.upstream.podcasts.base_url = "ftp://podcasts".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("upstream.podcasts.base_url"));
    }

    #[test]
    fn test_zero_fallback_capacity() {
        let mut config = AppConfig::default();
        config.cache.fallback_max_entries = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigValidationError::InvalidCapacity {
                name: "cache.fallback_max_entries".to_string()
            }]
        );
    }
}
