//! Admin console: events, agents, highlights, revista posts and the read cache.
//!
//! Every route requires an admin bearer token.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use super::agents::agent_kind;
use super::request::json_body;
use crate::backend::Backend;
use crate::cache::CacheStats;
use crate::http::Controller;
use crate::model::{Agent, Event, Highlight, RevistaPost};
use crate::schema::{AgentDraft, EventDraft, HighlightDraft, RevistaPostDraft};
use crate::service::{auth, Curation, ReadCache, Result};

type Body<T> = std::result::Result<Json<T>, JsonRejection>;

#[derive(Debug, Deserialize)]
struct ReorderBody {
    ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CacheState {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<CacheStats>,
}

pub struct CurationController {
    backend: Arc<dyn Backend>,
    curation: Arc<Curation>,
    cache: ReadCache,
}

impl CurationController {
    pub fn new(backend: Arc<dyn Backend>, curation: Arc<Curation>, cache: ReadCache) -> Self {
        Self {
            backend,
            curation,
            cache,
        }
    }

    async fn admin(&self, headers: &HeaderMap) -> Result<()> {
        auth::authenticate_admin(self.backend.as_ref(), headers).await?;
        Ok(())
    }

    // Events

    async fn create_event(
        State(controller): State<Arc<Self>>,
        headers: HeaderMap,
        body: Body<EventDraft>,
    ) -> Result<impl IntoResponse> {
        controller.admin(&headers).await?;
        let event = controller.curation.create_event(json_body(body)?).await?;
        Ok((StatusCode::CREATED, Json(event)))
    }

    async fn update_event(
        State(controller): State<Arc<Self>>,
        Path(id): Path<String>,
        headers: HeaderMap,
        body: Body<EventDraft>,
    ) -> Result<Json<Event>> {
        controller.admin(&headers).await?;
        Ok(Json(controller.curation.update_event(&id, json_body(body)?).await?))
    }

    async fn delete_event(
        State(controller): State<Arc<Self>>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Result<StatusCode> {
        controller.admin(&headers).await?;
        controller.curation.delete_event(&id).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    // Agents

    async fn create_agent(
        State(controller): State<Arc<Self>>,
        Path(kind): Path<String>,
        headers: HeaderMap,
        body: Body<AgentDraft>,
    ) -> Result<impl IntoResponse> {
        controller.admin(&headers).await?;
        let kind = agent_kind(&kind)?;
        let agent = controller.curation.create_agent(kind, json_body(body)?).await?;
        Ok((StatusCode::CREATED, Json(agent)))
    }

    async fn update_agent(
        State(controller): State<Arc<Self>>,
        Path((kind, id)): Path<(String, String)>,
        headers: HeaderMap,
        body: Body<AgentDraft>,
    ) -> Result<Json<Agent>> {
        controller.admin(&headers).await?;
        let kind = agent_kind(&kind)?;
        Ok(Json(
            controller.curation.update_agent(kind, &id, json_body(body)?).await?,
        ))
    }

    async fn delete_agent(
        State(controller): State<Arc<Self>>,
        Path((kind, id)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> Result<StatusCode> {
        controller.admin(&headers).await?;
        let kind = agent_kind(&kind)?;
        controller.curation.delete_agent(kind, &id).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    // Highlights

    async fn list_highlights(
        State(controller): State<Arc<Self>>,
        Path(placement): Path<String>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<Highlight>>> {
        controller.admin(&headers).await?;
        Ok(Json(controller.curation.list_highlights(&placement).await?))
    }

    async fn reorder_highlights(
        State(controller): State<Arc<Self>>,
        Path(placement): Path<String>,
        headers: HeaderMap,
        body: Body<ReorderBody>,
    ) -> Result<Json<Vec<Highlight>>> {
        controller.admin(&headers).await?;
        let body = json_body(body)?;
        Ok(Json(
            controller
                .curation
                .reorder_highlights(&placement, &body.ids)
                .await?,
        ))
    }

    async fn create_highlight(
        State(controller): State<Arc<Self>>,
        headers: HeaderMap,
        body: Body<HighlightDraft>,
    ) -> Result<impl IntoResponse> {
        controller.admin(&headers).await?;
        let highlight = controller.curation.create_highlight(json_body(body)?).await?;
        Ok((StatusCode::CREATED, Json(highlight)))
    }

    async fn update_highlight(
        State(controller): State<Arc<Self>>,
        Path(id): Path<String>,
        headers: HeaderMap,
        body: Body<HighlightDraft>,
    ) -> Result<Json<Highlight>> {
        controller.admin(&headers).await?;
        Ok(Json(
            controller.curation.update_highlight(&id, json_body(body)?).await?,
        ))
    }

    async fn delete_highlight(
        State(controller): State<Arc<Self>>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Result<StatusCode> {
        controller.admin(&headers).await?;
        controller.curation.delete_highlight(&id).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    // Revista

    async fn list_posts(
        State(controller): State<Arc<Self>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<RevistaPost>>> {
        controller.admin(&headers).await?;
        Ok(Json(controller.curation.list_posts().await?))
    }

    async fn create_post(
        State(controller): State<Arc<Self>>,
        headers: HeaderMap,
        body: Body<RevistaPostDraft>,
    ) -> Result<impl IntoResponse> {
        controller.admin(&headers).await?;
        let post = controller.curation.create_post(json_body(body)?).await?;
        Ok((StatusCode::CREATED, Json(post)))
    }

    async fn update_post(
        State(controller): State<Arc<Self>>,
        Path(id): Path<String>,
        headers: HeaderMap,
        body: Body<RevistaPostDraft>,
    ) -> Result<Json<RevistaPost>> {
        controller.admin(&headers).await?;
        Ok(Json(controller.curation.update_post(&id, json_body(body)?).await?))
    }

    async fn delete_post(
        State(controller): State<Arc<Self>>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Result<StatusCode> {
        controller.admin(&headers).await?;
        controller.curation.delete_post(&id).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    async fn publish_post(
        State(controller): State<Arc<Self>>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Json<RevistaPost>> {
        controller.admin(&headers).await?;
        Ok(Json(controller.curation.publish_post(&id).await?))
    }

    async fn unpublish_post(
        State(controller): State<Arc<Self>>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Json<RevistaPost>> {
        controller.admin(&headers).await?;
        Ok(Json(controller.curation.unpublish_post(&id).await?))
    }

    // Cache

    async fn cache_stats(
        State(controller): State<Arc<Self>>,
        headers: HeaderMap,
    ) -> Result<Json<CacheState>> {
        controller.admin(&headers).await?;
        let stats = controller.cache.stats();
        Ok(Json(CacheState {
            enabled: stats.is_some(),
            stats,
        }))
    }

    async fn clear_cache(
        State(controller): State<Arc<Self>>,
        headers: HeaderMap,
    ) -> Result<Json<serde_json::Value>> {
        controller.admin(&headers).await?;
        controller.cache.clear();
        info!(component = "curation", event = "cache_cleared", "read cache cleared");
        Ok(Json(json!({ "cleared": true })))
    }
}

impl Controller for CurationController {
    fn add_route(&self, router: Router) -> Router {
        let routes = Router::new()
            .route("/api/admin/events", post(Self::create_event))
            .route(
                "/api/admin/events/:id",
                put(Self::update_event).delete(Self::delete_event),
            )
            .route("/api/admin/agents/:kind", post(Self::create_agent))
            .route(
                "/api/admin/agents/:kind/:id",
                put(Self::update_agent).delete(Self::delete_agent),
            )
            .route("/api/admin/highlights", post(Self::create_highlight))
            .route(
                "/api/admin/highlights/:id",
                put(Self::update_highlight).delete(Self::delete_highlight),
            )
            .route(
                "/api/admin/placements/:placement/highlights",
                get(Self::list_highlights).put(Self::reorder_highlights),
            )
            .route(
                "/api/admin/posts",
                get(Self::list_posts).post(Self::create_post),
            )
            .route(
                "/api/admin/posts/:id",
                put(Self::update_post).delete(Self::delete_post),
            )
            .route("/api/admin/posts/:id/publish", post(Self::publish_post))
            .route("/api/admin/posts/:id/unpublish", post(Self::unpublish_post))
            .route(
                "/api/admin/cache",
                get(Self::cache_stats).delete(Self::clear_cache),
            )
            .with_state(Arc::new(self.clone()));
        router.merge(routes)
    }
}

impl Clone for CurationController {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            curation: self.curation.clone(),
            cache: self.cache.clone(),
        }
    }
}
