// Main entrypoint for the ROLÊ service.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use role::app::App;
use role::config::{Config, ConfigTrait};
use role::liveness;
use role::shutdown::GracefulShutdown;

const CONFIG_PATH: &str = "cfg/role.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/role.cfg.local.yaml";

/// ROLÊ - cultural events platform service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,
}

/// Builds the tokio runtime with the configured worker count.
fn build_runtime(cfg: &Config) -> Result<tokio::runtime::Runtime> {
    let configured = cfg.runtime().num_cpus;
    let workers = if configured == 0 {
        num_cpus::get()
    } else {
        configured
    };
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then falls back to default config.
fn load_cfg(path: Option<PathBuf>) -> Result<Config> {
    if let Some(custom_path) = path {
        return Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path));
    }

    match Config::load(PathBuf::from(CONFIG_PATH_LOCAL)) {
        Ok(cfg) => Ok(cfg),
        Err(_) => Config::load(PathBuf::from(CONFIG_PATH))
            .with_context(|| format!("failed to load config from {}", CONFIG_PATH)),
    }
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs()
        .and_then(|logs| logs.level.as_deref())
        .unwrap_or("debug");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if cfg.is_prod() {
        // Production: JSON format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        // Development: Pretty console format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = load_cfg(args.cfg)?;
    configure_logger(&cfg);

    info!(
        component = "config",
        event = "load_success",
        env = %cfg.role.env,
        backend = ?cfg.backend().mode,
        "config loaded"
    );

    // The recorder must be installed before the runtime starts.
    if let Err(e) = role::controller::metrics::init_prometheus_exporter() {
        warn!(
            component = "main",
            event = "metrics_init_failed",
            error = %e,
            "metrics endpoint will not be available"
        );
    }

    let runtime = build_runtime(&cfg)?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<()> {
    let shutdown_token = CancellationToken::new();

    // Cached clock
    let _ctime_token = role::time::start(Duration::from_millis(1));

    let graceful_shutdown = GracefulShutdown::new(shutdown_token.clone());
    graceful_shutdown.set_graceful_timeout(Duration::from_secs(60));

    let probe_timeout = cfg
        .k8s()
        .and_then(|k8s| k8s.probe.timeout)
        .unwrap_or(liveness::DEFAULT_TIMEOUT);
    let probe = Arc::new(liveness::Probe::new(probe_timeout));

    let app = App::new(shutdown_token.clone(), cfg, probe)?;

    graceful_shutdown.add(1);
    let done = graceful_shutdown.clone();
    tokio::task::spawn(async move {
        if let Err(e) = app.serve().await {
            error!(
                component = "main",
                scope = "app",
                event = "start_failed",
                error = %e,
                "failed to start app"
            );
        }
        done.done();
    });

    if let Err(e) = graceful_shutdown.await_shutdown().await {
        error!(
            component = "main",
            scope = "service",
            event = "graceful_shutdown_failed",
            error = %e,
            "failed to gracefully shut down service"
        );
        return Err(e);
    }

    Ok(())
}
