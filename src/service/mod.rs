//! Business logic behind the HTTP controllers.
//!
//! Services own an `Arc<dyn Backend>` and, for reads, the shared [`ReadCache`];
//! they return [`ServiceError`], which renders itself as a JSON response.

pub mod auth;
pub mod catalog;
pub mod curation;
pub mod error;
pub mod forms;
pub mod orphans;
pub mod push;
pub mod read_cache;
pub mod social;

#[cfg(test)]
mod curation_test;
#[cfg(test)]
mod forms_test;
#[cfg(test)]
mod orphans_test;
#[cfg(test)]
mod social_test;

pub use catalog::{AgentFilter, Catalog, EventFilter, Page, PageParams};
pub use curation::Curation;
pub use error::{Result, ServiceError};
pub use forms::Forms;
pub use orphans::{BucketReport, OrphanReport, OrphanScanner};
pub use push::{PushReport, PushSender, PushService};
pub use read_cache::ReadCache;
pub use social::Social;

use std::sync::Arc;

use crate::backend::Backend;
use crate::config::Config;

/// Every service wired to one backend and one cache.
#[derive(Clone)]
pub struct Services {
    pub backend: Arc<dyn Backend>,
    pub cache: ReadCache,
    pub catalog: Arc<Catalog>,
    pub social: Arc<Social>,
    pub curation: Arc<Curation>,
    pub forms: Arc<Forms>,
    pub push: Arc<PushService>,
    pub orphans: Arc<OrphanScanner>,
}

impl Services {
    /// Builds services from config; push delivery uses the configured relay.
    pub fn new(cfg: &Config, backend: Arc<dyn Backend>) -> anyhow::Result<Self> {
        let push = push::from_config(backend.clone(), cfg)?;
        Ok(Self::with_push(cfg, backend, push))
    }

    /// Builds services around an already constructed push service.
    pub fn with_push(cfg: &Config, backend: Arc<dyn Backend>, push: PushService) -> Self {
        let cache = ReadCache::from_config(cfg);
        Self {
            catalog: Arc::new(Catalog::new(backend.clone(), cache.clone())),
            social: Arc::new(Social::new(backend.clone(), cache.clone())),
            curation: Arc::new(Curation::new(backend.clone(), cache.clone())),
            forms: Arc::new(Forms::from_config(backend.clone(), cfg)),
            push: Arc::new(push),
            orphans: Arc::new(OrphanScanner::from_config(backend.clone(), cfg)),
            cache,
            backend,
        }
    }
}
