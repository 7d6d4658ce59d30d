//! Rolling-window rate limiter for catalog API calls.
//!
//! The catalog enforces a quota over any moving W-second interval, not a
//! fixed bucket that resets on a boundary. A burst that fills the quota at
//! the end of one window and the start of the next must still be throttled
//! continuously, so admission works over a log of recent request instants.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Published TMDB quota: 40 requests per rolling 10 seconds.
pub const TMDB_MAX_REQUESTS: usize = 40;
pub const TMDB_WINDOW: Duration = Duration::from_secs(10);

/// Sliding-window-log rate limiter.
///
/// `admit` blocks the caller until issuing one more request would keep the
/// count within the quota for every sliding window. It never errors and is
/// not bypassable: every outbound catalog call goes through it.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            admitted: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// A limiter configured for the TMDB reference quota.
    pub fn for_tmdb() -> Self {
        Self::new(TMDB_MAX_REQUESTS, TMDB_WINDOW)
    }

    /// Wait until one more request fits inside the rolling window, then
    /// record it as admitted.
    pub async fn admit(&self) {
        let mut admitted = self.admitted.lock().await;
        loop {
            let now = Instant::now();
            while admitted
                .front()
                .is_some_and(|&t| now.duration_since(t) >= self.window)
            {
                admitted.pop_front();
            }
            if admitted.len() < self.max_requests {
                break;
            }
            // Sleep until the oldest admitted request ages out, then re-check:
            // other entries may still hold the count at the ceiling.
            let oldest = *admitted.front().expect("log is non-empty at the ceiling");
            let wake_at = oldest + self.window;
            debug!(
                wait_secs = (wake_at - now).as_secs_f64(),
                "rate limit reached, waiting"
            );
            tokio::time::sleep_until(wake_at).await;
        }
        admitted.push_back(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_admits_up_to_quota_without_waiting() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.admit().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_over_quota_call_blocks_for_remaining_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10));
        for _ in 0..3 {
            limiter.admit().await;
        }
        tokio::time::advance(Duration::from_secs(4)).await;

        let start = Instant::now();
        limiter.admit().await;
        // The 4th call must wait until the 1st ages out: 10s window minus
        // the 4s already elapsed since the 1st call.
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sliding_window_exceeds_quota() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10));
        let mut stamps = Vec::new();
        for _ in 0..6 {
            limiter.admit().await;
            stamps.push(Instant::now());
            tokio::time::advance(Duration::from_secs(1)).await;
        }
        for (i, &t) in stamps.iter().enumerate() {
            let in_window = stamps[i..]
                .iter()
                .take_while(|&&u| u.duration_since(t) < Duration::from_secs(10))
                .count();
            assert!(in_window <= 2, "window starting at stamp {i} holds {in_window} requests");
        }
    }
}
