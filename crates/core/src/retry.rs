//! Retry mechanism with quadratic backoff
//!
//! A failed listing attempt is retried against the same client when the
//! error is transient (timeouts, connection resets, throttling). Attempt `n`
//! is followed by a pause of `n²` seconds: 1s, 4s, 9s, ...

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
}

impl RetryConfig {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Source of backoff pauses
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Pause after the given 1-based attempt
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt).pow(2))
}

/// Run `operation`, retrying transient failures.
///
/// After a transient failure on attempt `n` (with attempts left) this sleeps
/// `n²` seconds, calls `on_retry(n, delay, &error)`, and runs `operation`
/// again. Terminal errors and the error of the final attempt are returned.
///
/// # Example
/// ```ignore
/// run_with_retry(
///     &RetryConfig::default(),
///     &TokioSleeper,
///     |attempt, _, _| println!("Retrying ... {attempt}"),
///     || drive(client, recursive, move |e| formatter.print_item(e)),
/// ).await?;
/// ```
pub async fn run_with_retry<T, F, Fut, N>(
    config: &RetryConfig,
    sleeper: &dyn Sleeper,
    mut on_retry: N,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    N: FnMut(u32, Duration, &Error),
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !is_retryable_error(&err) {
            return Err(err);
        }
        if attempt >= max_attempts {
            tracing::warn!(attempts = attempt, error = %err, "Giving up after transient errors");
            return Err(err);
        }

        let delay = backoff_delay(attempt);
        tracing::debug!(
            attempt = attempt,
            backoff_ms = delay.as_millis(),
            error = %err,
            "Retrying after transient error"
        );
        sleeper.sleep(delay).await;
        on_retry(attempt, delay, &err);
        attempt += 1;
    }
}

/// Check if an error is retryable (transient)
pub fn is_retryable_error(error: &Error) -> bool {
    match error.root() {
        Error::Network(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("timeout")
                || msg_lower.contains("timed out")
                || msg_lower.contains("connection reset")
                || msg_lower.contains("connection refused")
                || msg_lower.contains("broken pipe")
                || msg_lower.contains("503")
                || msg_lower.contains("service unavailable")
                || msg_lower.contains("too many requests")
                || msg_lower.contains("429")
                || msg_lower.contains("slow down")
        }
        Error::Io(e) => matches!(
            e.kind(),
            std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::Interrupted
        ),
        _ => false,
    }
}
