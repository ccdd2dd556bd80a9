// HTTP server implementation for the application.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ConfigTrait};
use crate::controller;
use crate::http::{Controller, Middleware};
use crate::liveness;
use crate::middleware;
use crate::service::Services;

/// HTTP server implementation that wraps all dependencies.
pub struct HttpServer {
    server: Arc<crate::http::HttpServer>,
    is_server_alive: Arc<AtomicBool>,
}

impl HttpServer {
    /// Creates a new HttpServer with every controller and middleware.
    pub fn new(
        ctx: CancellationToken,
        cfg: &Config,
        services: &Services,
        probe: Arc<liveness::Probe>,
    ) -> Result<Self> {
        let controllers = Self::controllers(cfg, services, probe);
        let middlewares = Self::middlewares(cfg);
        let server = crate::http::HttpServer::new(ctx, cfg.clone(), controllers, middlewares)?;

        Ok(Self {
            server,
            is_server_alive: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns true if the server is marked as alive.
    pub fn is_alive(&self) -> bool {
        self.is_server_alive.load(Ordering::Relaxed)
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        self.server.bind().await
    }

    /// Serves on `listener` until shutdown (blocking call).
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        self.is_server_alive.store(true, Ordering::Relaxed);
        let result = self.server.serve(listener).await;
        self.is_server_alive.store(false, Ordering::Relaxed);
        result
    }

    /// Returns all HTTP controllers for the server.
    fn controllers(
        cfg: &Config,
        services: &Services,
        probe: Arc<liveness::Probe>,
    ) -> Vec<Box<dyn Controller>> {
        vec![
            // Healthcheck probe endpoint
            Box::new(controller::LivenessProbeController::new(probe)),
            // Metrics endpoint
            Box::new(controller::PrometheusMetricsController::new()),
            // Encodes and shows current config as json
            Box::new(controller::ShowConfigController::new(cfg.clone())),
            // Public reads
            Box::new(controller::EventsController::new(services.catalog.clone())),
            Box::new(controller::AgentsController::new(services.catalog.clone())),
            Box::new(controller::HighlightsController::new(services.catalog.clone())),
            Box::new(controller::RevistaController::new(services.catalog.clone())),
            // Follows, attendance, reviews, comments
            Box::new(controller::SocialController::new(
                services.backend.clone(),
                services.social.clone(),
            )),
            // Admin console
            Box::new(controller::CurationController::new(
                services.backend.clone(),
                services.curation.clone(),
                services.cache.clone(),
            )),
            // Serverless handlers
            Box::new(controller::FormsController::new(services.forms.clone())),
            Box::new(controller::PushController::new(
                services.backend.clone(),
                services.push.clone(),
            )),
            Box::new(controller::OrphansController::new(
                services.backend.clone(),
                services.orphans.clone(),
            )),
        ]
    }

    /// Returns the request middlewares for the server; the first is outermost.
    fn middlewares(cfg: &Config) -> Vec<Box<dyn Middleware>> {
        vec![
            Box::new(middleware::PanicRecoverMiddleware::new()),
            Box::new(middleware::TraceMiddleware::new()),
            Box::new(middleware::CorsMiddleware::new(
                cfg.api()
                    .and_then(|a| a.allowed_origins.clone())
                    .unwrap_or_default(),
            )),
            Box::new(middleware::CompressionMiddleware::new(
                cfg.compression().cloned(),
            )),
        ]
    }
}

#[async_trait]
impl liveness::Service for HttpServer {
    fn name(&self) -> &'static str {
        "http_server"
    }

    async fn is_alive(&self) -> bool {
        HttpServer::is_alive(self)
    }
}
