//! Process-wide spacing between Sheets API requests.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::trace;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Lets one request through per `min_interval`, without bursts.
pub struct Throttle {
    limiter: Option<DirectRateLimiter>,
    min_interval: Duration,
}

impl Throttle {
    /// A zero interval disables throttling.
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval)
            .map(|quota| quota.allow_burst(NonZeroU32::MIN))
            .map(DirectRateLimiter::direct);
        Self {
            limiter,
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the next request may be sent.
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
            trace!("Sheets request slot acquired");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn spaces_consecutive_requests() {
        let throttle = Throttle::new(Duration::from_millis(60));
        let started = Instant::now();

        throttle.wait().await;
        throttle.wait().await;
        throttle.wait().await;

        assert!(started.elapsed() >= Duration::from_millis(110));
    }

    #[tokio::test]
    async fn zero_interval_never_waits() {
        let throttle = Throttle::new(Duration::ZERO);
        let started = Instant::now();
        for _ in 0..100 {
            throttle.wait().await;
        }
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
