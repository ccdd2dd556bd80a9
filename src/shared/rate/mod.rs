//! Per-client rate limiting for the public form handlers.

use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Outcome of a rate limit check that was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exceeded {
    pub retry_after: Duration,
}

/// Keyed token bucket: each key may spend at most `requests` cells within
/// any `window`. Spent cells come back one per `window`.
pub struct Limiter {
    name: &'static str,
    clock: DefaultClock,
    inner: Arc<KeyedLimiter>,
}

impl Limiter {
    /// Creates a new keyed limiter. Zero values are clamped to one request per
    /// one second so a misconfigured limiter stays usable.
    pub fn new(name: &'static str, requests: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        let window = if window.is_zero() {
            Duration::from_secs(1)
        } else {
            window
        };

        // A full-window period bounds burst plus refill to `requests`.
        let quota = Quota::with_period(window)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        let clock = DefaultClock::default();
        let inner = Arc::new(RateLimiter::new(
            quota,
            DefaultKeyedStateStore::default(),
            &clock,
        ));

        Self { name, clock, inner }
    }

    /// Spends one cell for `key`.
    pub fn check(&self, key: &str) -> Result<(), Exceeded> {
        match self.inner.check_key(&key.to_string()) {
            Ok(()) => Ok(()),
            Err(not_until) => {
                let retry_after = not_until.wait_time_from(self.clock.now());
                debug!(
                    component = "rate",
                    limiter = self.name,
                    key = key,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "rate limit exceeded"
                );
                Err(Exceeded { retry_after })
            }
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drops state for keys whose buckets have fully refilled.
    pub fn retain_recent(&self) {
        self.inner.retain_recent();
        self.inner.shrink_to_fit();
    }

    /// Periodically forgets idle keys until cancelled.
    pub fn spawn_cleanup(self: &Arc<Self>, shutdown_token: CancellationToken, every: Duration) {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown_token.cancelled() => break,
                    _ = interval.tick() => limiter.retain_recent(),
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_burst_then_denies() {
        let limiter = Limiter::new("test", 3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").is_ok());
        }
        let denied = limiter.check("10.0.0.1").unwrap_err();
        assert!(denied.retry_after > Duration::ZERO);
        assert!(denied.retry_after <= Duration::from_secs(60));
    }

    #[test]
    fn never_exceeds_requests_within_a_window() {
        let window = Duration::from_millis(1000);
        let limiter = Limiter::new("test", 3, window);
        let start = std::time::Instant::now();
        let mut admitted = 0;
        while start.elapsed() < Duration::from_millis(700) {
            if limiter.check("k").is_ok() {
                admitted += 1;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(admitted, 3);

        std::thread::sleep(window);
        assert!(limiter.check("k").is_ok());
        assert!(limiter.check("k").is_err());
    }

    #[test]
    fn keys_are_isolated() {
        let limiter = Limiter::new("test", 1, Duration::from_secs(60));
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_err());
        assert!(limiter.check("b").is_ok());
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn zero_requests_is_clamped() {
        let limiter = Limiter::new("test", 0, Duration::ZERO);
        assert!(limiter.check("a").is_ok());
    }
}
