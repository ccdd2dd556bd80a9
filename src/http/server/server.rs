//! HTTP server implementation.

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

use crate::config::{Config, ConfigTrait};
use crate::controller::controller::Controller;
use crate::middleware::middleware::Middleware;

pub const DEFAULT_NAME: &str = "role";
pub const DEFAULT_PORT: &str = "8020";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Server trait for HTTP server operations.
#[async_trait::async_trait]
pub trait Server: Send + Sync {
    /// Starts the server (blocking).
    async fn listen_and_serve(&self) -> Result<()>;
}

/// HTTP server implementation.
pub struct HttpServer {
    shutdown_token: CancellationToken,
    config: Config,
    router: Router,
}

impl HttpServer {
    /// Creates a new HTTP server.
    pub fn new(
        shutdown_token: CancellationToken,
        config: Config,
        controllers: Vec<Box<dyn Controller>>,
        middlewares: Vec<Box<dyn Middleware>>,
    ) -> Result<Arc<Self>> {
        let timeout = config
            .api()
            .and_then(|a| a.timeout)
            .unwrap_or(DEFAULT_TIMEOUT);
        let router = Self::build_router(controllers);
        let router = Self::merge_middlewares(router, middlewares, timeout);

        Ok(Arc::new(Self {
            shutdown_token,
            config,
            router,
        }))
    }

    fn name(&self) -> &str {
        self.config
            .api()
            .and_then(|a| a.name.as_deref())
            .unwrap_or(DEFAULT_NAME)
    }

    /// Listen address from `api.port`; `"0"` picks an ephemeral port.
    pub fn addr(&self) -> Result<SocketAddr> {
        let port = self
            .config
            .api()
            .and_then(|a| a.port.as_deref())
            .unwrap_or(DEFAULT_PORT);
        let port = port.trim_start_matches(':');
        format!("0.0.0.0:{}", port)
            .parse()
            .with_context(|| format!("failed to parse server address from port {:?}", port))
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.addr()?;
        TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind TCP listener on {}", addr))
    }

    /// Serves on an already bound listener until the shutdown token fires.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let name = self.name().to_string();
        let local_addr = listener.local_addr().ok();

        info!(
            component = "server",
            event = "started",
            name = %name,
            addr = ?local_addr,
            "server started"
        );

        let shutdown_token = self.shutdown_token.clone();
        let serve_future = axum::serve(
            listener,
            self.router
                .clone()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown_token.cancelled().await;
        });

        if let Err(e) = serve_future.await {
            error!(
                component = "server",
                event = "listen_and_serve_failed",
                name = %name,
                addr = ?local_addr,
                error = %e,
                "server failed to listen and serve"
            );
            return Err(e.into());
        }

        info!(
            component = "server",
            event = "stopped",
            name = %name,
            addr = ?local_addr,
            "server stopped"
        );

        Ok(())
    }

    /// Binds the configured port and serves.
    pub async fn listen_and_serve(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Builds the router with all controllers.
    fn build_router(controllers: Vec<Box<dyn Controller>>) -> Router {
        controllers
            .iter()
            .fold(Router::new(), |router, controller| controller.add_route(router))
    }

    /// Merges middlewares into the router; the first middleware ends up outermost.
    fn merge_middlewares(
        router: Router,
        middlewares: Vec<Box<dyn Middleware>>,
        timeout: Duration,
    ) -> Router {
        let router = router.layer(TimeoutLayer::new(timeout));
        middlewares
            .iter()
            .rev()
            .fold(router, |router, middleware| middleware.apply(router))
    }
}

#[async_trait::async_trait]
impl Server for HttpServer {
    async fn listen_and_serve(&self) -> Result<()> {
        HttpServer::listen_and_serve(self).await
    }
}
