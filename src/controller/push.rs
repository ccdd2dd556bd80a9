//! Push fan-out (admin) and the caller's own subscriptions.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::request::json_body;
use crate::backend::Backend;
use crate::http::Controller;
use crate::schema::{PushRequest, SubscriptionInput};
use crate::service::{auth, PushReport, PushService, Result};

pub const SEND_PUSH_PATH: &str = "/functions/send-push";
pub const SUBSCRIPTIONS_PATH: &str = "/api/push/subscriptions";

#[derive(Debug, Deserialize)]
struct UnsubscribeBody {
    endpoint: String,
}

pub struct PushController {
    backend: Arc<dyn Backend>,
    push: Arc<PushService>,
}

impl PushController {
    pub fn new(backend: Arc<dyn Backend>, push: Arc<PushService>) -> Self {
        Self { backend, push }
    }

    async fn send(
        State(controller): State<Arc<Self>>,
        headers: HeaderMap,
        body: std::result::Result<Json<PushRequest>, JsonRejection>,
    ) -> Result<Json<PushReport>> {
        auth::authenticate_admin(controller.backend.as_ref(), &headers).await?;
        Ok(Json(controller.push.send(json_body(body)?).await?))
    }

    async fn subscribe(
        State(controller): State<Arc<Self>>,
        headers: HeaderMap,
        body: std::result::Result<Json<SubscriptionInput>, JsonRejection>,
    ) -> Result<impl IntoResponse> {
        let user = auth::authenticate(controller.backend.as_ref(), &headers).await?;
        let subscription = controller.push.subscribe(&user, json_body(body)?).await?;
        Ok((StatusCode::CREATED, Json(subscription)))
    }

    async fn unsubscribe(
        State(controller): State<Arc<Self>>,
        headers: HeaderMap,
        body: std::result::Result<Json<UnsubscribeBody>, JsonRejection>,
    ) -> Result<StatusCode> {
        let user = auth::authenticate(controller.backend.as_ref(), &headers).await?;
        let body = json_body(body)?;
        controller.push.unsubscribe(&user, &body.endpoint).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}

impl Controller for PushController {
    fn add_route(&self, router: Router) -> Router {
        let routes = Router::new()
            .route(SEND_PUSH_PATH, post(Self::send))
            .route(
                SUBSCRIPTIONS_PATH,
                post(Self::subscribe).delete(Self::unsubscribe),
            )
            .with_state(Arc::new(self.clone()));
        router.merge(routes)
    }
}

impl Clone for PushController {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            push: self.push.clone(),
        }
    }
}
