//! Normalized errors for calls to third-party APIs.
//!
//! Every failure coming back from the news or podcast APIs is classified once,
//! at the point where it is observed (HTTP status, transport failure, or an
//! error code inside the response body). The retry executor and the HTTP layer
//! only ever look at the resulting [`UpstreamErrorKind`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum UpstreamErrorKind {
    /// The upstream rejected the call because of request volume.
    RateLimited,
    /// The upstream (or the network path to it) is unavailable.
    Unavailable,
    /// The upstream did not answer in time.
    Timeout,
    /// The request was malformed or had invalid parameters.
    BadRequest,
    /// The API credential was missing, invalid, or disabled.
    Unauthorized,
    /// The requested resource does not exist upstream.
    NotFound,
    /// Anything that could not be classified.
    Unknown,
}

impl UpstreamErrorKind {
    /// Whether a failure of this kind is worth retrying.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Unavailable | Self::Timeout)
    }

    /// Classifies an HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            502 | 503 => Self::Unavailable,
            408 | 504 => Self::Timeout,
            400 | 422 => Self::BadRequest,
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            _ => Self::Unknown,
        }
    }

    /// Classifies an error code carried in an upstream error payload.
    ///
    /// Codes follow the News API vocabulary (`rateLimited`, `apiKeyInvalid`,
    /// `parameterInvalid`, ...); the podcast API uses the same convention.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let kind = match code {
            "rateLimited" | "apiKeyExhausted" => Self::RateLimited,
            "apiKeyDisabled" | "apiKeyInvalid" | "apiKeyMissing" => Self::Unauthorized,
            "parameterInvalid" | "parametersMissing" | "sourcesTooMany" => Self::BadRequest,
            "sourceDoesNotExist" | "notFound" => Self::NotFound,
            "unexpectedError" | "serviceUnavailable" => Self::Unavailable,
            "timeout" => Self::Timeout,
            _ => return None,
        };
        Some(kind)
    }

    /// Machine-readable name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Unavailable => "unavailable",
            Self::Timeout => "timeout",
            Self::BadRequest => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified upstream failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NormalizedUpstreamError {
    /// Failure class.
    pub kind: UpstreamErrorKind,
    /// Diagnostic message (upstream message or transport error text).
    pub message: String,
    /// Whether the retry executor may try again.
    pub retryable: bool,
    /// HTTP status returned by the upstream, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl NormalizedUpstreamError {
    /// Creates an error of the given kind; retryability follows the kind.
    #[must_use]
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.is_retryable(),
            status: None,
        }
    }

    /// Creates an error from an HTTP status code.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::from_status(status), message).with_status(status)
    }

    /// Creates an error from an error payload (`status: "error"`).
    ///
    /// The payload code wins over the HTTP status; a 2xx status with an
    /// unrecognized code is `Unknown`.
    #[must_use]
    pub fn from_payload(http_status: u16, code: Option<&str>, message: Option<&str>) -> Self {
        let kind = code
            .and_then(UpstreamErrorKind::from_code)
            .unwrap_or_else(|| UpstreamErrorKind::from_status(http_status));
        let message = message
            .or(code)
            .unwrap_or("upstream returned an error payload")
            .to_string();
        Self::new(kind, message).with_status(http_status)
    }

    /// Attaches the HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Message suitable for showing to an end user.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self.kind {
            UpstreamErrorKind::RateLimited => {
                "The content provider is receiving too many requests. Please try again in a moment."
            }
            UpstreamErrorKind::Unavailable => {
                "The content provider is currently unavailable. Please try again later."
            }
            UpstreamErrorKind::Timeout => "Request timed out. Please try again.",
            UpstreamErrorKind::BadRequest => "The request could not be processed. Please adjust your search.",
            UpstreamErrorKind::Unauthorized => "The content provider rejected our credentials.",
            UpstreamErrorKind::NotFound => "The requested content could not be found.",
            UpstreamErrorKind::Unknown => "An unexpected error occurred while loading content.",
        }
    }
}

impl fmt::Display for NormalizedUpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {}): {}", self.kind, status, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for NormalizedUpstreamError {}
