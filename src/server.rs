//! Server startup, shutdown, and worker spawning logic.
//!
//! This module contains the `run_server` function which handles:
//! - Registry construction
//! - Activity worker and retention job spawning
//! - Router creation
//! - Server binding and graceful shutdown

use crate::activity::{create_activity_channel, ActivityLog, ActivityWorker, Level, Package, TracingSink};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::jobs::RetentionJob;
use crate::routes;
use crate::services::{Registry, RegistrySettings};
use crate::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

/// Assemble the shared handler state for a registry.
pub fn build_state(config: &Config, registry: Arc<Registry>, activity: ActivityLog) -> Arc<AppState> {
    Arc::new(AppState {
        registry,
        activity,
        base_url: config.url.base_url.clone(),
        default_validity_minutes: config.url.default_validity_minutes,
    })
}

/// Run the web server with the given configuration.
///
/// # Errors
///
/// This function will return an error if:
/// - Server binding fails
/// - Server runtime error occurs
pub async fn run_server(config: Config) -> AppResult<()> {
    info!("Starting clicklink server...");

    let registry = Arc::new(Registry::new(RegistrySettings::from(&config.url)));

    // Activity log worker
    let (activity, activity_receiver) = create_activity_channel();
    let worker = ActivityWorker::new(Arc::new(TracingSink), activity_receiver);
    let worker_handle = tokio::spawn(worker.run());

    // Retention job, only when a retention window is configured
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let retention_handle =
        RetentionJob::from_config(registry.clone(), activity.clone(), &config.retention)
            .map(|job| tokio::spawn(job.run(shutdown_rx)));
    if retention_handle.is_none() {
        info!("Retention disabled, expired URLs are kept for the life of the process");
    }

    let state = build_state(&config, registry, activity.clone());
    let app = routes::create_router(state, &config.cors, &config.rate_limit);

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);
    info!("Base URL: {}", config.url.base_url);
    activity.backend(
        Level::Info,
        Package::Config,
        format!("Server started on port {}", config.server.port),
    );

    // Run server with graceful shutdown
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(create_shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)));

    // Stop the retention job, then let the activity worker drain
    let _ = shutdown_tx.send(true);
    if let Some(handle) = retention_handle {
        if let Err(e) = handle.await {
            error!("Retention task failed: {:?}", e);
        }
    }

    drop(activity);
    if let Err(e) = worker_handle.await {
        error!("Activity worker task failed: {:?}", e);
    }

    served?;
    info!("Server shutdown complete");
    Ok(())
}

/// Create a future that resolves when a shutdown signal is received.
///
/// On Unix-like systems, this listens for both Ctrl+C (SIGINT) and SIGTERM.
/// On other platforms, it only listens for Ctrl+C.
///
/// # Panics
///
/// Panics if signal handler installation fails; without it the process cannot
/// shut down gracefully at all.
async fn create_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    info!("Shutdown signal received");
}
