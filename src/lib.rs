pub mod api;
pub mod background;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod state;

use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::api::router::create_router;
use crate::background::start_background_worker;
use crate::config::Config;
use crate::infra::factory::bootstrap_state;

/// Pretty console output plus daily-rolled JSON files under `log_dir`.
/// Dropping the guard flushes the file writer.
pub fn init_logging(log_dir: &str) -> WorkerGuard {
    let (file_writer, guard) = tracing_appender::non_blocking(
        tracing_appender::rolling::daily(log_dir, "event-guest-service.log"),
    );

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("info,event_guest_backend=debug"));

    let console_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(json_layer)
        .init();

    info!("Logging to console and {}", log_dir);
    guard
}

pub async fn run() {
    let config = Config::from_env();
    let _guard = init_logging(&config.log_dir);

    let state = Arc::new(bootstrap_state(&config).await);
    let worker = tokio::spawn(start_background_worker(state.clone()));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return;
        }
    };

    info!("Server running on {}", addr);
    let served = axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = served {
        error!("Server error: {}", e);
    }

    // jobs claimed mid-batch are requeued when the worker next starts
    worker.abort();
    info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections");
}
