// Package liveness provides Kubernetes liveness probe functionality.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

pub mod error;
pub mod service;

pub use error::TimeoutIsTooShortError;
pub use service::Service;

const MIN_TIMEOUT: Duration = Duration::from_millis(1);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness probe: alive while every watched service answers in time.
pub struct Probe {
    services: RwLock<Vec<Arc<dyn Service>>>,
    timeout: Duration,
}

impl Probe {
    /// Creates a new liveness probe
    pub fn new(timeout_duration: Duration) -> Self {
        let timeout = if timeout_duration < MIN_TIMEOUT {
            warn!(
                component = "liveness",
                error = %TimeoutIsTooShortError,
                "min timeout duration is 1ms (timeout set up as 10ms as a more reasonable value)"
            );
            Duration::from_millis(10)
        } else {
            timeout_duration
        };

        Self {
            services: RwLock::new(Vec::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Adds services to the set checked on every probe.
    pub fn watch(&self, services: Vec<Arc<dyn Service>>) {
        self.services.write().extend(services);
    }

    /// Checks every watched service within the probe timeout.
    pub async fn is_alive(&self) -> bool {
        let services: Vec<Arc<dyn Service>> = self.services.read().clone();
        let checks = futures::future::join_all(services.iter().map(|s| async move {
            let alive = s.is_alive().await;
            if !alive {
                warn!(component = "liveness", service = s.name(), "service is not alive");
            }
            alive
        }));

        match timeout(self.timeout, checks).await {
            Ok(results) => results.into_iter().all(|alive| alive),
            Err(_) => {
                warn!(
                    component = "liveness",
                    timeout_ms = self.timeout.as_millis() as u64,
                    "liveness probe deadline exceeded while checking services"
                );
                false
            }
        }
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(bool);

    #[async_trait]
    impl Service for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn is_alive(&self) -> bool {
            self.0
        }
    }

    struct Slow;

    #[async_trait]
    impl Service for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn is_alive(&self) -> bool {
            tokio::time::sleep(Duration::from_secs(5)).await;
            true
        }
    }

    #[tokio::test]
    async fn alive_only_when_every_service_is() {
        let probe = Probe::new(Duration::from_millis(200));
        assert!(probe.is_alive().await, "no services means alive");

        probe.watch(vec![Arc::new(Fixed(true))]);
        assert!(probe.is_alive().await);

        probe.watch(vec![Arc::new(Fixed(false))]);
        assert!(!probe.is_alive().await);
    }

    #[tokio::test]
    async fn deadline_exceeded_is_not_alive() {
        let probe = Probe::new(Duration::from_millis(20));
        probe.watch(vec![Arc::new(Slow)]);
        assert!(!probe.is_alive().await);
    }

    #[test]
    fn too_short_timeout_is_raised() {
        assert_eq!(Probe::new(Duration::ZERO).timeout(), Duration::from_millis(10));
    }
}
