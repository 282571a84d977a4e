//! Timeout wrapper for async operations.

use std::time::Duration;
use tidings_core::{TidingsError, TidingsResult};

/// Wraps an async operation with a timeout.
///
/// An elapsed operation becomes [`TidingsError::Timeout`], which the retry
/// executor treats as retryable.
pub async fn with_timeout<F, Fut, T>(duration: Duration, f: F) -> TidingsResult<T>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = TidingsResult<T>>,
{
    tokio::time::timeout(duration, f())
        .await
        .map_err(|_| TidingsError::Timeout(format!("Operation timed out after {:?}", duration)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_success() {
        let result = with_timeout(Duration::from_secs(1), || async { Ok::<_, TidingsError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_exceeded() {
        let result = with_timeout(Duration::from_millis(10), || async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, TidingsError>(42)
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, TidingsError::Timeout(_)));
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: TidingsResult<()> = with_timeout(Duration::from_secs(1), || async {
            Err(TidingsError::validation("bad"))
        })
        .await;

        assert!(matches!(result, Err(TidingsError::Validation(_))));
    }
}
