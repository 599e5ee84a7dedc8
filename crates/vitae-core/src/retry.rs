//! Bounded exponential-backoff retry helper.
//!
//! Used by auxiliary sinks (logging fallbacks, storage uploads); never by
//! user-facing submissions, which follow the task lifecycle instead.

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, ErrorKind};

/// Tracing target for retry attempts.
const TRACING_TARGET: &str = "vitae_core::retry";

/// Invokes `operation` up to `max_retries` times, doubling `delay` after
/// each failure.
///
/// On exhaustion the last error is returned, wrapped with the attempt
/// count. A `max_retries` of zero is treated as one attempt.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    delay: Duration,
    mut operation: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let attempts = max_retries.max(1);
    let mut backoff = delay;
    let mut last_error: Option<Error> = None;

    for attempt in 1..=attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    attempt,
                    max_attempts = attempts,
                    error = %error,
                    "operation failed"
                );
                last_error = Some(error);
            }
        }

        if attempt < attempts {
            tokio::time::sleep(backoff).await;
            backoff = backoff.saturating_mul(2);
        }
    }

    let last = last_error.unwrap_or_else(|| Error::new(ErrorKind::Internal));
    Err(Error::new(last.kind)
        .with_message(format!("operation failed after {attempts} attempts: {last}"))
        .with_source(last))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn returns_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_with_backoff(3, Duration::from_millis(1), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_with_backoff(3, Duration::from_millis(1), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ErrorKind::UpstreamFailure.with_message("flaky"))
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_wraps_the_last_error_with_attempt_count() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), Error> =
            retry_with_backoff(3, Duration::from_millis(1), move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ErrorKind::UpstreamFailure.with_message("still down"))
                }
            })
            .await;

        let error = result.unwrap_err();
        assert_eq!(error.kind, ErrorKind::UpstreamFailure);
        assert!(error.to_string().contains("after 3 attempts"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
