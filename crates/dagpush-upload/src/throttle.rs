//! Launch spacing for concurrent probes

use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

/// Enforces a minimum interval between task launches
///
/// Tasks call [`LaunchTicker::wait`] before starting. The quota has a burst
/// of one, so waiters are released one per period. A zero interval disables
/// throttling.
pub struct LaunchTicker {
    limiter: Option<DefaultDirectRateLimiter>,
}

impl LaunchTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            limiter: Quota::with_period(period).map(RateLimiter::direct),
        }
    }

    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_spacing() {
        let ticker = LaunchTicker::new(Duration::from_millis(25));
        let start = Instant::now();
        for _ in 0..5 {
            ticker.wait().await;
        }
        // first launch is immediate
        assert!(start.elapsed() >= Duration::from_millis(95));
    }

    #[tokio::test]
    async fn test_concurrent_waiters_are_spaced() {
        let ticker = LaunchTicker::new(Duration::from_millis(20));
        let start = Instant::now();
        futures::future::join_all((0..4).map(|_| ticker.wait())).await;
        assert!(start.elapsed() >= Duration::from_millis(55));
    }

    #[tokio::test]
    async fn test_zero_is_unthrottled() {
        let ticker = LaunchTicker::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..100 {
            ticker.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
