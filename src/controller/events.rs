//! Public event listing and detail.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::request::query_params;
use crate::http::Controller;
use crate::model::Event;
use crate::service::{Catalog, EventFilter, Page, Result};

pub struct EventsController {
    catalog: Arc<Catalog>,
}

impl EventsController {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    async fn list(
        State(controller): State<Arc<Self>>,
        query: std::result::Result<Query<EventFilter>, QueryRejection>,
    ) -> Result<Json<Page<Event>>> {
        let filter = query_params(query)?;
        Ok(Json(controller.catalog.list_events(filter).await?))
    }

    async fn get(
        State(controller): State<Arc<Self>>,
        Path(slug): Path<String>,
    ) -> Result<Json<Event>> {
        Ok(Json(controller.catalog.get_event(&slug).await?))
    }
}

impl Controller for EventsController {
    fn add_route(&self, router: Router) -> Router {
        let routes = Router::new()
            .route("/api/events", get(Self::list))
            .route("/api/events/:slug", get(Self::get))
            .with_state(Arc::new(self.clone()));
        router.merge(routes)
    }
}

impl Clone for EventsController {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
        }
    }
}
