//! Mastering Daemon (somp-md) - Main entry point
//!
//! Stand-alone HTTP service that accepts mastering jobs, processes them
//! through the somp-dsp pipeline, and reports results to callback URLs.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use somp_md::api::{self, AppContext};
use somp_md::config::{Args, Config};
use somp_md::jobs::JobManager;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "somp_md=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::resolve(args).context("Failed to resolve configuration")?;

    info!("Starting SOMP Mastering Daemon on port {}", config.port);
    info!("Workspace: {}", config.workspace.display());
    info!("Deployment mode: {}", config.location);
    info!("DSP workers: {}", config.dsp_workers);

    tokio::fs::create_dir_all(&config.workspace)
        .await
        .context("Failed to create workspace directory")?;

    // Initialize the job manager and its dispatch loop
    let manager =
        Arc::new(JobManager::new(config.clone()).context("Failed to initialize job manager")?);

    let dispatcher = manager.clone();
    tokio::spawn(async move {
        if let Err(e) = dispatcher.run().await {
            error!("Job dispatch loop stopped: {}", e);
        }
    });

    // Build the application router
    let app = api::create_router(AppContext { manager });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
