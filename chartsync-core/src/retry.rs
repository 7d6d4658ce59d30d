//! Bounded exponential-backoff retry for destination writes.
//!
//! Expressed as an explicit policy object applied at each call site rather
//! than as a decorator, so the retry surface of every network mutation is
//! visible where it happens.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

/// Outcome of one attempt of a retryable destination write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write was dispatched and the service answered with this status.
    Status(u16),
    /// No network action was needed (e.g. nothing to write). Counts as
    /// success and must not be retried.
    AlreadySatisfied,
}

impl WriteOutcome {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            WriteOutcome::AlreadySatisfied | WriteOutcome::Status(200 | 201)
        )
    }
}

/// Retry policy: up to `max_attempts` attempts with `backoff_factor^attempt`
/// seconds of sleep after each failed attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_factor: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_factor: u32) -> Self {
        Self {
            max_attempts,
            backoff_factor,
        }
    }

    /// Run `call` until it succeeds or attempts are exhausted.
    ///
    /// Returns `None` on exhaustion. The caller must treat that as "this one
    /// item did not update" and continue; it is never fatal to the run.
    pub async fn run<F, Fut, E>(&self, label: &str, mut call: F) -> Option<WriteOutcome>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<WriteOutcome, E>>,
        E: std::fmt::Display,
    {
        for attempt in 0..self.max_attempts {
            match call().await {
                Ok(outcome) if outcome.is_success() => return Some(outcome),
                Ok(outcome) => {
                    warn!(
                        "attempt {} for {label} failed with {outcome:?}, retrying",
                        attempt + 1
                    );
                }
                Err(err) => {
                    warn!("attempt {} for {label} failed: {err}, retrying", attempt + 1);
                }
            }
            let backoff = Duration::from_secs(u64::from(self.backoff_factor.pow(attempt)));
            tokio::time::sleep(backoff).await;
        }
        error!("all {} attempts for {label} failed", self.max_attempts);
        None
    }
}

/// Transport-level retry for idempotent GETs against the source site and
/// the catalog: connection errors and a small set of transient statuses get
/// a few quick retries before the failure surfaces to the caller. Distinct
/// from [`RetryPolicy`], which wraps whole destination mutations.
#[derive(Debug, Clone, Copy)]
pub struct TransportRetry {
    pub retries: u32,
    pub backoff: Duration,
}

impl Default for TransportRetry {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl TransportRetry {
    /// The service is throttling or briefly down; trying again can help.
    fn is_transient(status: reqwest::StatusCode) -> bool {
        matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
    }

    /// Send an idempotent request, retrying transport errors and transient
    /// statuses with exponential backoff. The final attempt's outcome is
    /// returned as-is.
    pub async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> reqwest::Result<reqwest::Response> {
        for attempt in 0..self.retries {
            let Some(cloned) = request.try_clone() else {
                // Streaming bodies cannot be replayed; send once.
                break;
            };
            match cloned.send().await {
                Ok(response) if !Self::is_transient(response.status()) => return Ok(response),
                Ok(response) => {
                    warn!("transient status {}, retrying", response.status());
                }
                Err(err) => {
                    warn!("transport error: {err}, retrying");
                }
            }
            tokio::time::sleep(self.backoff * 2u32.pow(attempt)).await;
        }
        request.send().await
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::convert::Infallible;

    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_with_exponential_sleeps() {
        let policy = RetryPolicy::new(10, 2);
        let statuses = RefCell::new(vec![500u16, 500, 201]);
        let statuses = &statuses;

        let start = Instant::now();
        let outcome = policy
            .run("test write", move || async move {
                let status = statuses.borrow_mut().remove(0);
                Ok::<_, Infallible>(WriteOutcome::Status(status))
            })
            .await;

        assert_eq!(outcome, Some(WriteOutcome::Status(201)));
        // Two failed attempts sleep 2^0 and 2^1 seconds before the third.
        assert_eq!(start.elapsed(), Duration::from_secs(1 + 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_failure_marker() {
        let policy = RetryPolicy::new(3, 2);
        let attempts = RefCell::new(0u32);
        let attempts = &attempts;

        let outcome = policy
            .run("test write", move || async move {
                *attempts.borrow_mut() += 1;
                Ok::<_, Infallible>(WriteOutcome::Status(500))
            })
            .await;

        assert_eq!(outcome, None);
        assert_eq!(*attempts.borrow(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_satisfied_short_circuits() {
        let policy = RetryPolicy::new(10, 2);
        let attempts = RefCell::new(0u32);
        let attempts = &attempts;

        let start = Instant::now();
        let outcome = policy
            .run("test write", move || async move {
                *attempts.borrow_mut() += 1;
                Ok::<_, Infallible>(WriteOutcome::AlreadySatisfied)
            })
            .await;

        assert_eq!(outcome, Some(WriteOutcome::AlreadySatisfied));
        assert_eq!(*attempts.borrow(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_transient_statuses() {
        for status in [429u16, 500, 502, 503, 504] {
            assert!(TransportRetry::is_transient(
                reqwest::StatusCode::from_u16(status).unwrap()
            ));
        }
        for status in [200u16, 201, 304, 404, 401] {
            assert!(!TransportRetry::is_transient(
                reqwest::StatusCode::from_u16(status).unwrap()
            ));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_count_as_failed_attempts() {
        let policy = RetryPolicy::new(2, 2);
        let attempts = RefCell::new(0u32);
        let attempts = &attempts;

        let outcome = policy
            .run("test write", move || async move {
                *attempts.borrow_mut() += 1;
                Err::<WriteOutcome, _>("connection reset")
            })
            .await;

        assert_eq!(outcome, None);
        assert_eq!(*attempts.borrow(), 2);
    }
}
