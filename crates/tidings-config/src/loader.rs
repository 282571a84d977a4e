//! Configuration loader with layered sources.

use crate::{AppConfig, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use tidings_core::TidingsError;
use tracing::{debug, info, warn};

/// Conventional environment variables honored on top of `TIDINGS__*`.
const CONVENTIONAL_VARS: &[(&str, &str)] = &[
    ("REDIS_HOST", "redis.host"),
    ("REDIS_PORT", "redis.port"),
    ("NEWS_API_KEY", "upstream.news.api_key"),
    ("PODCAST_API_KEY", "upstream.podcasts.api_key"),
    ("CACHE_INVALIDATION_KEY", "admin.invalidation_key"),
];

/// Configuration loader.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AppConfig,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `TIDINGS__` prefix
    /// 5. Conventional variables (`REDIS_HOST`, `NEWS_API_KEY`, ...)
    pub fn new(config_dir: impl AsRef<Path>) -> Result<Self, TidingsError> {
        let config = Self::load_config(config_dir.as_ref())?;
        Ok(Self { config })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, TidingsError> {
        Self::new("./config")
    }

    /// Returns the loaded configuration.
    #[must_use]
    pub fn get(&self) -> AppConfig {
        self.config.clone()
    }

    /// Loads configuration from the specified directory.
    fn load_config(config_dir: &Path) -> Result<AppConfig, TidingsError> {
        // Load .env file if present
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("TIDINGS_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = config_dir.join(format!("{}.toml", name));
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("TIDINGS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in CONVENTIONAL_VARS {
            let value = std::env::var(var).ok().filter(|v| !v.is_empty());
            if value.is_some() {
                debug!("Applying {} to {}", var, key);
            }
            builder = builder
                .set_override_option(*key, value)
                .map_err(config_error_to_tidings_error)?;
        }

        let config = builder.build().map_err(config_error_to_tidings_error)?;

        let mut app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_tidings_error)?;
        app_config.app.environment = environment;

        Self::validate_config(&app_config)?;

        Ok(app_config)
    }

    /// Validates the configuration, failing on hard errors and warning about
    /// settings that only degrade functionality.
    fn validate_config(config: &AppConfig) -> Result<(), TidingsError> {
        if config.upstream.news.api_key.is_empty() {
            warn!("No news API key configured; news requests will be rejected upstream");
        }
        if config.upstream.podcasts.api_key.is_empty() {
            warn!("No podcast API key configured; podcast requests will be rejected upstream");
        }
        if config.admin.invalidation_key.is_none() {
            warn!("No cache invalidation key configured; invalidation requests will be rejected");
        }

        ConfigValidator::validate(config).map_err(|errors| {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            TidingsError::Configuration(message)
        })
    }
}

fn config_error_to_tidings_error(err: ConfigError) -> TidingsError {
    TidingsError::Configuration(err.to_string())
}
