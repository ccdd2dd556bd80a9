//! Compression middleware.

use tower_http::compression::CompressionLayer;

use crate::config::Compression;

/// CompressionMiddleware provides gzip/brotli response compression when enabled.
pub struct CompressionMiddleware {
    cfg: Option<Compression>,
}

impl CompressionMiddleware {
    /// Creates a new compression middleware.
    pub fn new(cfg: Option<Compression>) -> Self {
        Self { cfg }
    }

    pub fn is_enabled(&self) -> bool {
        self.cfg.as_ref().map(|c| c.enabled).unwrap_or(false)
    }
}

impl Default for CompressionMiddleware {
    fn default() -> Self {
        Self::new(None)
    }
}

impl crate::middleware::middleware::Middleware for CompressionMiddleware {
    fn apply(&self, router: axum::Router) -> axum::Router {
        if !self.is_enabled() {
            return router;
        }
        router.layer(CompressionLayer::new().gzip(true).br(true))
    }
}
