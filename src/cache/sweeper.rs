//! Periodic removal of expired cache entries.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::TtlCache;

/// Background task sweeping a cache at a fixed interval.
pub struct Sweeper;

impl Sweeper {
    /// Spawns the sweep loop; it stops when `shutdown_token` is cancelled.
    pub fn spawn<V>(
        shutdown_token: CancellationToken,
        cache: Arc<TtlCache<V>>,
        interval: Duration,
    ) -> JoinHandle<()>
    where
        V: Clone + Send + Sync + 'static,
    {
        tokio::task::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately.
            ticker.tick().await;

            info!(
                component = "cache",
                scope = "sweeper",
                event = "started",
                cache = cache.name(),
                interval_ms = interval.as_millis() as u64,
                "cache sweeper started"
            );

            loop {
                tokio::select! {
                    _ = shutdown_token.cancelled() => {
                        info!(
                            component = "cache",
                            scope = "sweeper",
                            event = "stopped",
                            cache = cache.name(),
                            "cache sweeper stopped"
                        );
                        return;
                    }
                    _ = ticker.tick() => {
                        let removed = cache.sweep();
                        crate::metrics::set_cache_length(cache.name(), cache.len());
                        if removed > 0 {
                            debug!(
                                component = "cache",
                                scope = "sweeper",
                                event = "swept",
                                cache = cache.name(),
                                removed = removed,
                                "expired entries removed"
                            );
                        }
                    }
                }
            }
        })
    }
}
