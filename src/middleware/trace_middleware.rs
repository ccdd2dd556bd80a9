//! Request tracing and per-status response counters.

use axum::{extract::Request, middleware::Next, response::Response};
use tower_http::trace::TraceLayer;

async fn count_status(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    crate::metrics::inc_status_code(response.status().as_u16());
    response
}

pub struct TraceMiddleware;

impl TraceMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TraceMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::middleware::middleware::Middleware for TraceMiddleware {
    fn apply(&self, router: axum::Router) -> axum::Router {
        router
            .layer(axum::middleware::from_fn(count_status))
            .layer(TraceLayer::new_for_http())
    }
}
