//! Data access to the hosted backend: tables, RPCs, storage and auth sessions.

pub mod backend;
pub mod memory;
pub mod query;
pub mod rest;

#[cfg(test)]
mod query_test;

pub use backend::{fetch, fetch_one, Backend, BackendError, StoredObject};
pub use memory::MemoryBackend;
pub use query::{Filter, Order, Query};
pub use rest::RestBackend;

use anyhow::Result;
use std::sync::Arc;

use crate::config::{BackendMode, Config, ConfigTrait};

/// Builds the backend selected by `backend.mode`.
pub fn from_config(cfg: &Config) -> Result<Arc<dyn Backend>> {
    match cfg.backend().mode {
        BackendMode::Rest => Ok(Arc::new(RestBackend::new(cfg.backend())?)),
        BackendMode::Memory => Ok(Arc::new(MemoryBackend::new())),
    }
}
