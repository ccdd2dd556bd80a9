// Package api provides config display controller.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::config::Config;
use crate::http::Controller;

pub const CONFIG_PATH: &str = "/role/config";

/// ShowConfigController displays the current configuration.
///
/// Secrets (backend keys, relay token) are never serialized.
pub struct ShowConfigController {
    cfg: Arc<Config>,
}

impl ShowConfigController {
    /// Creates a new show config controller.
    pub fn new(cfg: Config) -> Self {
        Self { cfg: Arc::new(cfg) }
    }

    /// Handles the show config request.
    async fn show_config(State(cfg): State<Arc<Config>>) -> impl IntoResponse {
        match serde_json::to_string(&*cfg) {
            Ok(json) => (
                StatusCode::OK,
                [("content-type", "application/json; charset=utf-8")],
                json,
            ),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "application/json; charset=utf-8")],
                r#"{"error": "failed to serialize config"}"#.to_string(),
            ),
        }
    }
}

impl Controller for ShowConfigController {
    fn add_route(&self, router: Router) -> Router {
        let routes = Router::new()
            .route(CONFIG_PATH, get(Self::show_config))
            .with_state(self.cfg.clone());
        router.merge(routes)
    }
}
