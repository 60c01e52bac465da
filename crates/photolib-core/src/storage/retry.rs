//! Retry utilities for transient storage transport failures.
//!
//! Provides classification of retryable errors and exponential backoff.
//! Only the gateway transport retries; the upload pipeline never does.

use crate::error::{StorageError, StorageResult};
use std::future::Future;
use std::time::Duration;

/// How many times and how patiently to retry a storage request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub attempts: u32,
    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,
}

/// Determine whether a storage error is worth retrying.
///
/// Retryable errors: transport failures (connect, timeout), throttling (429),
/// server errors (5xx). Non-retryable: auth failures, bad requests, local I/O.
pub fn is_retryable(error: &StorageError) -> bool {
    match error {
        StorageError::Request { .. } => true,
        StorageError::Status { status, .. } => *status == 429 || (500..=599).contains(status),
        _ => false,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
///
/// `op` receives the zero-based attempt number and must rebuild its request
/// from scratch each time.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> StorageResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = StorageResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.attempts && is_retryable(&e) => {
                let delay = backoff_duration(attempt, policy.base_delay_ms);
                tracing::debug!(
                    "Retry {}/{} for {label} after {delay:?}: {e}",
                    attempt + 1,
                    policy.attempts
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn status(code: u16) -> StorageError {
        StorageError::Status {
            url: "https://acct.dfs.core.windows.net/photos/x".to_string(),
            status: code,
            message: String::new(),
        }
    }

    #[test]
    fn test_transport_error_is_retryable() {
        let err = StorageError::Request {
            url: "https://acct.dfs.core.windows.net".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_throttling_and_server_errors_are_retryable() {
        assert!(is_retryable(&status(429)));
        assert!(is_retryable(&status(500)));
        assert!(is_retryable(&status(503)));
    }

    #[test]
    fn test_client_errors_not_retryable() {
        assert!(!is_retryable(&status(400)));
        assert!(!is_retryable(&status(403)));
        assert!(!is_retryable(&status(404)));
        assert!(!is_retryable(&StorageError::InvalidKey("..".into())));
    }

    #[test]
    fn test_backoff_exponential() {
        assert_eq!(backoff_duration(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_duration(1, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_duration(2, 1000), Duration::from_millis(4000));
        assert_eq!(backoff_duration(3, 1000), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_capped_at_30s() {
        assert_eq!(backoff_duration(10, 1000), Duration::from_millis(30_000));
    }

    #[tokio::test]
    async fn test_with_retry_recovers_from_transient_failure() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            attempts: 3,
            base_delay_ms: 1,
        };
        let result = with_retry(policy, "test", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(status(503))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_stops_on_permanent_failure() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            attempts: 5,
            base_delay_ms: 1,
        };
        let result: StorageResult<()> = with_retry(policy, "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(status(403)) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            attempts: 2,
            base_delay_ms: 1,
        };
        let result: StorageResult<()> = with_retry(policy, "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(status(500)) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
