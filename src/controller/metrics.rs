//! Metrics controller.

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use metrics_process::Collector;
use std::sync::OnceLock;

use crate::http::Controller;

pub const PROMETHEUS_METRICS_PATH: &str = "/metrics";

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static PROCESS_COLLECTOR: OnceLock<Collector> = OnceLock::new();

/// Installs the Prometheus recorder as the global `metrics` recorder.
///
/// Calling it again is a no-op, so tests booting several servers share one
/// recorder.
pub fn init_prometheus_exporter() -> anyhow::Result<()> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {}", e))?;
    // Lost race: another caller installed first and its handle renders the same registry.
    let _ = PROMETHEUS_HANDLE.set(handle);

    let collector = PROCESS_COLLECTOR.get_or_init(Collector::default);
    collector.describe();
    Ok(())
}

/// PrometheusMetricsController handles Prometheus metrics endpoint.
pub struct PrometheusMetricsController;

impl PrometheusMetricsController {
    /// Creates a new Prometheus metrics controller.
    pub fn new() -> Self {
        Self
    }

    /// Renders service and process metrics in the text exposition format.
    async fn get_metrics() -> impl IntoResponse {
        let Some(handle) = PROMETHEUS_HANDLE.get() else {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain; charset=utf-8")],
                "# metrics recorder is not installed\n".to_string(),
            );
        };
        if let Some(collector) = PROCESS_COLLECTOR.get() {
            collector.collect();
        }
        (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
    }
}

impl Default for PrometheusMetricsController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for PrometheusMetricsController {
    fn add_route(&self, router: Router) -> Router {
        router.route(PROMETHEUS_METRICS_PATH, get(Self::get_metrics))
    }
}
