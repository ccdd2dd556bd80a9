//! In-memory TTL cache for public catalog reads.

pub mod clock;
pub mod sweeper;
pub mod ttl;

#[cfg(test)]
mod ttl_test;

pub use clock::{Clock, SystemClock};
pub use sweeper::Sweeper;
pub use ttl::{CacheEntry, CacheStats, TtlCache};
