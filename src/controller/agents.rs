//! Public artist, venue and organizer listings and profiles.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::request::query_params;
use crate::http::Controller;
use crate::model::{Agent, AgentKind, AgentProfile};
use crate::service::{AgentFilter, Catalog, Page, Result, ServiceError};

/// Parses the `:kind` path segment; unknown kinds are a missing route.
pub fn agent_kind(raw: &str) -> Result<AgentKind> {
    raw.parse()
        .map_err(|_| ServiceError::not_found(format!("agent kind {}", raw)))
}

pub struct AgentsController {
    catalog: Arc<Catalog>,
}

impl AgentsController {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    async fn list(
        State(controller): State<Arc<Self>>,
        Path(kind): Path<String>,
        query: std::result::Result<Query<AgentFilter>, QueryRejection>,
    ) -> Result<Json<Page<Agent>>> {
        let kind = agent_kind(&kind)?;
        let filter = query_params(query)?;
        Ok(Json(controller.catalog.list_agents(kind, filter).await?))
    }

    async fn profile(
        State(controller): State<Arc<Self>>,
        Path((kind, slug)): Path<(String, String)>,
    ) -> Result<Json<AgentProfile>> {
        let kind = agent_kind(&kind)?;
        Ok(Json(controller.catalog.get_agent_profile(kind, &slug).await?))
    }
}

impl Controller for AgentsController {
    fn add_route(&self, router: Router) -> Router {
        let routes = Router::new()
            .route("/api/agents/:kind", get(Self::list))
            .route("/api/agents/:kind/:slug", get(Self::profile))
            .with_state(Arc::new(self.clone()));
        router.merge(routes)
    }
}

impl Clone for AgentsController {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
        }
    }
}
