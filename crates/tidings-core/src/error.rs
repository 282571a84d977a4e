//! Unified error types for all layers of the application.

use crate::{NormalizedUpstreamError, UpstreamErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for Tidings.
///
/// Cache failures (`CacheUnavailable`, `Serialization`) are recovered inside
/// the cache layer and never reach an HTTP client. Upstream failures are
/// retried according to policy and surface as [`TidingsError::Upstream`].
#[derive(Error, Debug)]
pub enum TidingsError {
    // ============ Request Errors ============
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unauthorized access
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // ============ Infrastructure Errors ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Distributed cache unreachable or refusing operations
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Value could not be (de)serialized for the cache
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ============ Upstream Errors ============
    /// Classified failure from a third-party API
    #[error("Upstream error: {0}")]
    Upstream(NormalizedUpstreamError),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TidingsError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Upstream(err) => match err.kind {
                UpstreamErrorKind::RateLimited => 429,
                UpstreamErrorKind::Unavailable => 503,
                UpstreamErrorKind::Timeout => 504,
                UpstreamErrorKind::BadRequest => 400,
                UpstreamErrorKind::NotFound => 404,
                UpstreamErrorKind::Unauthorized | UpstreamErrorKind::Unknown => 502,
            },
            Self::Timeout(_) => 504,
            Self::CacheUnavailable(_) => 503,
            Self::Configuration(_) | Self::Serialization(_) | Self::Internal(_) | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::CacheUnavailable(_) => "CACHE_UNAVAILABLE",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Upstream(err) => match err.kind {
                UpstreamErrorKind::RateLimited => "UPSTREAM_RATE_LIMITED",
                UpstreamErrorKind::Unavailable => "UPSTREAM_UNAVAILABLE",
                UpstreamErrorKind::Timeout => "UPSTREAM_TIMEOUT",
                UpstreamErrorKind::BadRequest => "UPSTREAM_BAD_REQUEST",
                UpstreamErrorKind::Unauthorized => "UPSTREAM_AUTH_ERROR",
                UpstreamErrorKind::NotFound => "UPSTREAM_NOT_FOUND",
                UpstreamErrorKind::Unknown => "UPSTREAM_ERROR",
            },
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Message to show an end user.
    ///
    /// Upstream failures get the normalized human-readable text; everything
    /// else uses the display form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Upstream(err) => err.user_message().to_string(),
            Self::Timeout(_) => "Request timed out. Please try again.".to_string(),
            Self::Internal(_) | Self::Other(_) | Self::Configuration(_) | Self::Serialization(_) => {
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates a cache-unavailable error.
    #[must_use]
    pub fn cache_unavailable<T: Into<String>>(message: T) -> Self {
        Self::CacheUnavailable(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if this error is retriable.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::Upstream(err) => err.retryable,
            Self::Timeout(_) => true,
            _ => false,
        }
    }

    /// Converts this error into its normalized upstream form.
    ///
    /// Per-attempt timeouts become `Timeout`; errors that already are
    /// upstream errors are returned unchanged.
    #[must_use]
    pub fn into_upstream(self) -> Self {
        match self {
            Self::Upstream(_) => self,
            Self::Timeout(message) => {
                Self::Upstream(NormalizedUpstreamError::new(UpstreamErrorKind::Timeout, message))
            }
            other => Self::Upstream(NormalizedUpstreamError::new(
                UpstreamErrorKind::Unknown,
                other.to_string(),
            )),
        }
    }

    /// Returns the upstream error, if this is one.
    #[must_use]
    pub const fn as_upstream(&self) -> Option<&NormalizedUpstreamError> {
        match self {
            Self::Upstream(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NormalizedUpstreamError> for TidingsError {
    fn from(err: NormalizedUpstreamError) -> Self {
        Self::Upstream(err)
    }
}

impl From<serde_json::Error> for TidingsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Whether retrying the same request later may succeed
    #[serde(default)]
    pub retryable: bool,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-level validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}

impl ErrorResponse {
    /// Creates a new error response from a `TidingsError`.
    #[must_use]
    pub fn from_error(error: &TidingsError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.user_message(),
            retryable: error.is_retriable(),
            details: None,
        }
    }

    /// Sets field-level validation errors.
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&TidingsError> for ErrorResponse {
    fn from(error: &TidingsError) -> Self {
        Self::from_error(error)
    }
}
