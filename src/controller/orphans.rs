//! Storage-orphan scan (admin).

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::request::query_params;
use crate::backend::Backend;
use crate::http::Controller;
use crate::service::{auth, OrphanReport, OrphanScanner, Result};

pub const STORAGE_ORPHANS_PATH: &str = "/functions/storage-orphans";

#[derive(Debug, Deserialize)]
struct ScanParams {
    #[serde(default = "default_dry_run")]
    dry_run: bool,
}

fn default_dry_run() -> bool {
    true
}

pub struct OrphansController {
    backend: Arc<dyn Backend>,
    scanner: Arc<OrphanScanner>,
}

impl OrphansController {
    pub fn new(backend: Arc<dyn Backend>, scanner: Arc<OrphanScanner>) -> Self {
        Self { backend, scanner }
    }

    async fn scan(
        State(controller): State<Arc<Self>>,
        headers: HeaderMap,
        query: std::result::Result<Query<ScanParams>, QueryRejection>,
    ) -> Result<Json<OrphanReport>> {
        auth::authenticate_admin(controller.backend.as_ref(), &headers).await?;
        let params = query_params(query)?;
        Ok(Json(controller.scanner.scan(params.dry_run).await?))
    }
}

impl Controller for OrphansController {
    fn add_route(&self, router: Router) -> Router {
        let routes = Router::new()
            .route(STORAGE_ORPHANS_PATH, post(Self::scan))
            .with_state(Arc::new(self.clone()));
        router.merge(routes)
    }
}

impl Clone for OrphansController {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            scanner: self.scanner.clone(),
        }
    }
}
