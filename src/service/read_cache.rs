// Optional TTL cache in front of backend reads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use super::error::Result;
use crate::cache::{CacheStats, TtlCache};
use crate::config::{Config, ConfigTrait};

pub const CACHE_NAME: &str = "catalog";

/// Values are stored as JSON so one cache serves every read shape.
#[derive(Clone, Default)]
pub struct ReadCache {
    inner: Option<Arc<TtlCache<Value>>>,
}

impl ReadCache {
    pub fn new(cache: Arc<TtlCache<Value>>) -> Self {
        Self { inner: Some(cache) }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn from_config(cfg: &Config) -> Self {
        if !cfg.is_cache_enabled() {
            return Self::disabled();
        }
        Self::new(Arc::new(TtlCache::new(
            CACHE_NAME,
            cfg.cache_ttl(),
            cfg.cache_capacity(),
        )))
    }

    pub fn inner(&self) -> Option<&Arc<TtlCache<Value>>> {
        self.inner.as_ref()
    }

    /// Cached value under `key`, or the result of `fetch` (cached when it succeeds).
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let Some(cache) = &self.inner else {
            return fetch().await;
        };
        if let Some(hit) = cache.get(key) {
            match serde_json::from_value(hit) {
                Ok(v) => return Ok(v),
                Err(e) => {
                    debug!(component = "read_cache", key, error = %e, "dropping undecodable entry");
                    cache.remove(key);
                }
            }
        }
        let value = fetch().await?;
        cache.set(key, serde_json::to_value(&value)?);
        Ok(value)
    }

    /// Drops every entry under each prefix.
    pub fn invalidate(&self, prefixes: &[&str]) {
        if let Some(cache) = &self.inner {
            let removed: usize = prefixes.iter().map(|p| cache.invalidate_prefix(p)).sum();
            debug!(component = "read_cache", ?prefixes, removed, "invalidated");
        }
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.inner {
            cache.clear();
        }
    }

    pub fn stats(&self) -> Option<CacheStats> {
        self.inner.as_ref().map(|c| c.stats())
    }
}
