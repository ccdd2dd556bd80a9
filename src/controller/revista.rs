//! Published revista posts.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::request::query_params;
use crate::http::Controller;
use crate::model::RevistaPost;
use crate::service::{Catalog, Page, PageParams, Result};

pub struct RevistaController {
    catalog: Arc<Catalog>,
}

impl RevistaController {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    async fn list(
        State(controller): State<Arc<Self>>,
        query: std::result::Result<Query<PageParams>, QueryRejection>,
    ) -> Result<Json<Page<RevistaPost>>> {
        let page = query_params(query)?;
        Ok(Json(controller.catalog.list_posts(page).await?))
    }

    async fn get(
        State(controller): State<Arc<Self>>,
        Path(slug): Path<String>,
    ) -> Result<Json<RevistaPost>> {
        Ok(Json(controller.catalog.get_post(&slug).await?))
    }
}

impl Controller for RevistaController {
    fn add_route(&self, router: Router) -> Router {
        let routes = Router::new()
            .route("/api/posts", get(Self::list))
            .route("/api/posts/:slug", get(Self::get))
            .with_state(Arc::new(self.clone()));
        router.merge(routes)
    }
}

impl Clone for RevistaController {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
        }
    }
}
