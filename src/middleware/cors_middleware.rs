//! CORS for the single-page application's origins.

use axum::http::{header, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

const MAX_AGE: Duration = Duration::from_secs(600);

pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
}

impl CorsMiddleware {
    /// `"*"` allows any origin; an empty list adds no CORS headers.
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    fn layer(&self) -> Option<CorsLayer> {
        if self.allowed_origins.is_empty() {
            return None;
        }
        let origin = if self.allowed_origins.iter().any(|o| o == "*") {
            AllowOrigin::from(Any)
        } else {
            let origins: Vec<HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!(component = "cors", origin = %o, error = %e, "skipping invalid origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        };
        Some(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                .expose_headers([header::RETRY_AFTER])
                .max_age(MAX_AGE),
        )
    }
}

impl crate::middleware::middleware::Middleware for CorsMiddleware {
    fn apply(&self, router: axum::Router) -> axum::Router {
        match self.layer() {
            Some(layer) => router.layer(layer),
            None => router,
        }
    }
}
