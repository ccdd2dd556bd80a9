// Time source for cache expiry.

use std::time::SystemTime;

/// Clock used by the cache to stamp and expire entries.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Reads the process-wide cached clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        crate::time::now()
    }
}
