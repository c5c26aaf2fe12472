//! Retry loop: run an async unit of work until success or the policy says stop.

use super::error::ErrorSignature;
use super::policy::{RetryDecision, RetryPolicy};
use std::future::Future;
use std::time::Duration;

/// One scheduled retry, as reported to logs and observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryEvent {
    pub operation: String,
    /// 1-based number of the attempt that just failed.
    pub attempt: usize,
    pub total_attempts: usize,
    pub error_id: String,
    pub delay: Duration,
}

/// Runs `f` until it succeeds or the policy says to stop. On a retryable
/// failure, sleeps for the jittered delay then tries again. The error from the
/// last attempt is returned as-is.
///
/// Exactly one `warn` event is logged per scheduled retry; success, fail-fast
/// and exhaustion log nothing.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, operation: &str, f: F) -> Result<T, E>
where
    E: ErrorSignature,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    with_retry_notify(policy, operation, f, |_| {}).await
}

/// Like [`with_retry`], calling `notify` once per scheduled retry.
pub async fn with_retry_notify<T, E, F, Fut, N>(
    policy: &RetryPolicy,
    operation: &str,
    mut f: F,
    mut notify: N,
) -> Result<T, E>
where
    E: ErrorSignature,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    N: FnMut(&RetryEvent),
{
    let total_attempts = policy.total_attempts();
    let mut attempt = 0usize;
    loop {
        let err = match f().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let class = policy.classifier.classify(&err);
        match policy.decide_class(attempt, class) {
            RetryDecision::NoRetry(_) => return Err(err),
            RetryDecision::RetryAfter(delay) => {
                let event = RetryEvent {
                    operation: operation.to_string(),
                    attempt: attempt + 1,
                    total_attempts,
                    error_id: policy.classifier.identifier(&err),
                    delay,
                };
                tracing::warn!(
                    operation,
                    attempt = event.attempt,
                    total_attempts,
                    error_id = %event.error_id,
                    class = ?class,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, retrying"
                );
                notify(&event);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
