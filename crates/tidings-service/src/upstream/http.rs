//! Shared HTTP plumbing for upstream clients.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tidings_core::{NormalizedUpstreamError, TidingsError, TidingsResult, UpstreamErrorKind};

/// Header carrying the upstream API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Longest body excerpt kept in error messages.
const MAX_BODY_EXCERPT: usize = 200;

/// Creates an HTTP client with the given per-request timeout.
pub fn build_client(timeout: Duration) -> TidingsResult<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(16)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("tidings/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TidingsError::internal(format!("Failed to create HTTP client: {}", e)))
}

/// Error payload returned by upstream APIs (`{"status":"error", ...}`).
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    status: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

impl ErrorEnvelope {
    fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }
}

/// Classifies a transport-level failure.
pub fn transport_error(err: &reqwest::Error) -> TidingsError {
    let kind = if err.is_timeout() {
        UpstreamErrorKind::Timeout
    } else if err.is_connect() || err.is_request() || err.is_body() {
        UpstreamErrorKind::Unavailable
    } else {
        UpstreamErrorKind::Unknown
    };
    NormalizedUpstreamError::new(kind, err.to_string()).into()
}

/// Reads a JSON response, turning HTTP errors and `status: "error"` payloads
/// into normalized upstream errors.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> TidingsResult<T> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| transport_error(&e))?;
    let parsed: Option<Value> = serde_json::from_str(&body).ok();

    let envelope = parsed
        .as_ref()
        .and_then(|value| ErrorEnvelope::deserialize(value).ok());

    if !(200..300).contains(&status) {
        let err = match envelope {
            Some(env) if env.code.is_some() || env.message.is_some() => {
                NormalizedUpstreamError::from_payload(status, env.code.as_deref(), env.message.as_deref())
            }
            _ => NormalizedUpstreamError::from_status(status, excerpt(&body)),
        };
        return Err(err.into());
    }

    if let Some(env) = envelope.filter(ErrorEnvelope::is_error) {
        return Err(NormalizedUpstreamError::from_payload(
            status,
            env.code.as_deref(),
            env.message.as_deref(),
        )
        .into());
    }

    let Some(value) = parsed else {
        return Err(undecodable(status, "response body is not JSON"));
    };
    serde_json::from_value(value).map_err(|e| undecodable(status, &e.to_string()))
}

fn undecodable(status: u16, detail: &str) -> TidingsError {
    NormalizedUpstreamError::new(
        UpstreamErrorKind::Unknown,
        format!("Undecodable upstream response: {}", detail),
    )
    .with_status(status)
    .into()
}

fn excerpt(body: &str) -> String {
    if body.is_empty() {
        return "empty response body".to_string();
    }
    match body.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates() {
        let long = "x".repeat(500);
        let short = excerpt(&long);
        assert_eq!(short.len(), MAX_BODY_EXCERPT + 3);
        assert_eq!(excerpt(""), "empty response body");
        assert_eq!(excerpt("oops"), "oops");
    }

    #[test]
    fn test_envelope_detection() {
        let env: ErrorEnvelope =
            serde_json::from_str(r#"{"status":"error","code":"rateLimited","message":"slow down"}"#).unwrap();
        assert!(env.is_error());

        let ok: ErrorEnvelope = serde_json::from_str(r#"{"status":"ok","totalResults":0}"#).unwrap();
        assert!(!ok.is_error());
    }
}
