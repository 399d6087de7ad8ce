//! Caller-side deadlines
//!
//! The dispatcher defines no timeout of its own. Callers bound a call either
//! through the transport (`LLM_TIMEOUT_SECONDS`) or by wrapping the future here.
//! Dropping the future abandons the in-flight request.

use crate::error::DispatchError;
use std::future::Future;
use std::time::Duration;

/// Apply a deadline to a dispatch. An elapsed deadline is reported as a
/// transient error so it composes with [`retry_transient`](super::retry::retry_transient).
pub async fn with_timeout<T>(
    timeout: Duration,
    future: impl Future<Output = Result<T, DispatchError>>,
) -> Result<T, DispatchError> {
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(DispatchError::transient(format!(
            "request timed out after {:?}",
            timeout
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(Duration::from_secs(1), async { Ok::<_, DispatchError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_passes_inner_error_through() {
        let result: Result<i32, _> = with_timeout(Duration::from_secs(1), async {
            Err(DispatchError::configuration("bad"))
        })
        .await;

        assert!(matches!(result, Err(DispatchError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_with_timeout_elapsed_is_transient() {
        let result: Result<i32, _> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(42)
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("timed out"));
    }
}
