//! Cached time to avoid syscalls.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

static NOW_UNIX: AtomicI64 = AtomicI64::new(0);

fn system_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

const MIN_RESOLUTION: Duration = Duration::from_millis(1);

/// Starts the time caching ticker. Resolutions below one millisecond are
/// raised to it.
/// Updates the cached time value at the specified resolution until the
/// returned token is cancelled.
pub fn start(resolution: Duration) -> CancellationToken {
    NOW_UNIX.store(system_nanos(), Ordering::Relaxed);

    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::task::spawn(async move {
        let mut interval = tokio::time::interval(resolution.max(MIN_RESOLUTION));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    NOW_UNIX.store(system_nanos(), Ordering::Relaxed);
                }
                _ = token_clone.cancelled() => {
                    // Readers fall back to the system clock once the ticker is gone.
                    NOW_UNIX.store(0, Ordering::Relaxed);
                    break;
                }
            }
        }
    });

    token
}

/// Returns the cached Unix nanoseconds, or the system clock when the ticker is not running.
pub fn unix_nano() -> i64 {
    match NOW_UNIX.load(Ordering::Relaxed) {
        0 => system_nanos(),
        nanos => nanos,
    }
}

/// Returns the cached current time.
pub fn now() -> SystemTime {
    UNIX_EPOCH + Duration::from_nanos(unix_nano() as u64)
}

/// Returns the cached current time as a UTC timestamp.
pub fn now_utc() -> DateTime<Utc> {
    DateTime::<Utc>::from(now())
}

/// Returns the duration elapsed since the given time.
pub fn since(t: SystemTime) -> Duration {
    now().duration_since(t).unwrap_or(Duration::ZERO)
}
