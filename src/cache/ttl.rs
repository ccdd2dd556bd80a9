//! TTL map with insertion-order eviction.
//!
//! A read after `now > expires_at` is a miss and evicts the entry. When the map
//! grows past its capacity the oldest inserted entries are dropped first; reads
//! do not refresh an entry's position.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::clock::{Clock, SystemClock};
use crate::metrics;

/// A single cached value with its timestamps.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub inserted_at: SystemTime,
    pub expires_at: SystemTime,
    seq: u64,
}

impl<V> CacheEntry<V> {
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now > self.expires_at
    }
}

/// Point-in-time counters of a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evicted: u64,
    pub expired: u64,
}

struct Inner<V> {
    map: HashMap<String, CacheEntry<V>>,
    // (key, seq) in insertion order; stale pairs are skipped lazily.
    order: VecDeque<(String, u64)>,
    next_seq: u64,
}

/// Thread-safe TTL cache.
pub struct TtlCache<V> {
    name: &'static str,
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evicted: AtomicU64,
    expired: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    /// Creates a cache backed by the process clock.
    pub fn new(name: &'static str, ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(name, ttl, capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(
        name: &'static str,
        ttl: Duration,
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name,
            ttl,
            capacity: capacity.max(1),
            clock,
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
                next_seq: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a clone of the cached value, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        match self.lookup(key) {
            Some(v) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::add_cache_hits(self.name, 1);
                Some(v)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::add_cache_misses(self.name, 1);
                None
            }
        }
    }

    /// Same expiry semantics as [`get`](Self::get) without touching hit counters.
    pub fn has(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    fn lookup(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let expired = match inner.map.get(key) {
            None => return None,
            Some(entry) if !entry.is_expired(now) => return Some(entry.data.clone()),
            Some(_) => true,
        };
        if expired {
            inner.map.remove(key);
            self.expired.fetch_add(1, Ordering::Relaxed);
        }
        None
    }

    /// Returns the full entry (timestamps included) if it has not expired.
    pub fn entry(&self, key: &str) -> Option<CacheEntry<V>> {
        let now = self.clock.now();
        let inner = self.inner.lock();
        inner
            .map
            .get(key)
            .filter(|e| !e.is_expired(now))
            .cloned()
    }

    pub fn set(&self, key: impl Into<String>, data: V) {
        self.set_with_ttl(key, data, self.ttl)
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, data: V, ttl: Duration) {
        let key = key.into();
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let seq = inner.next_seq;
        inner.next_seq += 1;

        inner.order.push_back((key.clone(), seq));
        inner.map.insert(
            key,
            CacheEntry {
                data,
                inserted_at: now,
                expires_at: now + ttl,
                seq,
            },
        );

        while inner.map.len() > self.capacity {
            let Some((oldest, oldest_seq)) = inner.order.pop_front() else {
                break;
            };
            let live = inner
                .map
                .get(&oldest)
                .map(|e| e.seq == oldest_seq)
                .unwrap_or(false);
            if live {
                inner.map.remove(&oldest);
                self.evicted.fetch_add(1, Ordering::Relaxed);
            }
        }

        // Keep the order queue from accumulating stale pairs of replaced keys.
        if inner.order.len() > self.capacity.saturating_mul(2) {
            let Inner { map, order, .. } = &mut *inner;
            order.retain(|(k, s)| map.get(k).map(|e| e.seq == *s).unwrap_or(false));
        }
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.inner.lock().map.remove(key).map(|e| e.data)
    }

    /// Removes every entry whose key starts with `prefix`; returns how many were removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.map.len();
        inner.map.retain(|k, _| !k.starts_with(prefix));
        before - inner.map.len()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.map.clear();
        inner.order.clear();
    }

    /// Removes all expired entries and returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let before = inner.map.len();
        inner.map.retain(|_, e| !e.is_expired(now));
        let removed = before - inner.map.len();
        if removed > 0 {
            let Inner { map, order, .. } = &mut *inner;
            order.retain(|(k, s)| map.get(k).map(|e| e.seq == *s).unwrap_or(false));
            self.expired.fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            len: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }

    /// Returns the cached value or awaits `fetch`, caching only successful results.
    /// The lock is not held while `fetch` runs, so concurrent misses may fetch twice.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(v) = self.get(key) {
            return Ok(v);
        }
        let value = fetch().await?;
        self.set(key, value.clone());
        Ok(value)
    }
}
