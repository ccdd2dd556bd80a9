//! Featured events per placement.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::http::Controller;
use crate::model::FeaturedEvent;
use crate::service::{Catalog, Result};

pub struct HighlightsController {
    catalog: Arc<Catalog>,
}

impl HighlightsController {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    async fn list(
        State(controller): State<Arc<Self>>,
        Path(placement): Path<String>,
    ) -> Result<Json<Vec<FeaturedEvent>>> {
        Ok(Json(controller.catalog.list_highlights(&placement).await?))
    }
}

impl Controller for HighlightsController {
    fn add_route(&self, router: Router) -> Router {
        let routes = Router::new()
            .route("/api/highlights/:placement", get(Self::list))
            .with_state(Arc::new(self.clone()));
        router.merge(routes)
    }
}

impl Clone for HighlightsController {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
        }
    }
}
