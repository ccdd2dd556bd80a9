// Main application implementation.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::backend::{self, Backend};
use crate::cache::Sweeper;
use crate::config::{Config, ConfigTrait};
use crate::liveness;
use crate::service::Services;

use super::server::HttpServer;

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_LIMITER_CLEANUP: Duration = Duration::from_secs(60);

/// Reports the backend reachable to the liveness probe.
struct BackendHealth(Arc<dyn Backend>);

#[async_trait]
impl liveness::Service for BackendHealth {
    fn name(&self) -> &'static str {
        "backend"
    }

    async fn is_alive(&self) -> bool {
        match self.0.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    component = "app",
                    scope = "backend",
                    event = "ping_failed",
                    error = %e,
                    "backend is unreachable"
                );
                false
            }
        }
    }
}

/// Encapsulates the entire application state.
#[derive(Clone)]
pub struct App {
    cfg: Config,
    shutdown_token: CancellationToken,
    services: Services,
    probe: Arc<liveness::Probe>,
    server: Arc<HttpServer>,
}

impl App {
    /// Creates the application with the configured backend.
    pub fn new(
        shutdown_token: CancellationToken,
        cfg: Config,
        probe: Arc<liveness::Probe>,
    ) -> Result<Self> {
        let backend = backend::from_config(&cfg)?;
        let services = Services::new(&cfg, backend)?;
        Self::with_services(shutdown_token, cfg, services, probe)
    }

    /// Creates the application around prebuilt services.
    pub fn with_services(
        shutdown_token: CancellationToken,
        cfg: Config,
        services: Services,
        probe: Arc<liveness::Probe>,
    ) -> Result<Self> {
        let server = Arc::new(HttpServer::new(
            shutdown_token.clone(),
            &cfg,
            &services,
            probe.clone(),
        )?);

        Ok(Self {
            cfg,
            shutdown_token,
            services,
            probe,
            server,
        })
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Binds the configured port and serves until shutdown.
    pub async fn serve(&self) -> Result<()> {
        let listener = self.server.bind().await?;
        self.serve_on(listener).await
    }

    /// Serves on `listener` until shutdown; background workers stop with it.
    pub async fn serve_on(&self, listener: TcpListener) -> Result<()> {
        self.probe.watch(vec![
            self.server.clone() as Arc<dyn liveness::Service>,
            Arc::new(BackendHealth(self.services.backend.clone())),
        ]);
        self.start_workers();

        info!(component = "app", event = "started", "application lifecycle");

        let result = self.server.serve(listener).await;
        if let Err(e) = &result {
            error!(
                component = "app",
                scope = "server",
                event = "serve_failed",
                error = %e,
                "server failed to serve"
            );
        }
        self.close();
        result
    }

    fn start_workers(&self) {
        if let Some(cache) = self.services.cache.inner() {
            let interval = self
                .cfg
                .cache()
                .and_then(|c| c.sweep_interval)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL);
            Sweeper::spawn(self.shutdown_token.clone(), cache.clone(), interval);
        }

        let cleanup = self
            .cfg
            .forms()
            .and_then(|f| f.cleanup_interval)
            .unwrap_or(DEFAULT_LIMITER_CLEANUP);
        for limiter in self.services.forms.limiters() {
            limiter.spawn_cleanup(self.shutdown_token.clone(), cleanup);
        }
    }

    /// Stops background workers.
    pub fn close(&self) {
        self.shutdown_token.cancel();
        info!(component = "app", event = "stopped", "application lifecycle");
    }
}
