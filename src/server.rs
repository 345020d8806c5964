//! HTTP server initialization and runtime setup.
//!
//! Builds storage, audit sinks and the deletion pipeline, serves the router
//! until a shutdown signal arrives, then drains the background stages.

use crate::application::services::{AuthService, LinkService};
use crate::audit::{AuditDispatcher, init_sinks};
use crate::config::Config;
use crate::deletion::{ApplyReport, DeletionPipeline};
use crate::domain::repositories::UrlRepository;
use crate::infrastructure::persistence::{FileUrlRepository, MemoryUrlRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Memory or file storage
/// - Audit sinks and dispatcher
/// - Deletion pipeline
/// - Axum HTTP server with graceful shutdown on SIGINT/SIGTERM
///
/// After the server stops, the dispatcher and the pipeline are drained within
/// one `SHUTDOWN_TIMEOUT_SECS` budget and storage is persisted.
///
/// # Errors
///
/// Returns an error if:
/// - The storage file cannot be loaded
/// - The audit HTTP client cannot be built
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repository: Arc<dyn UrlRepository> = match &config.file_storage_path {
        Some(path) => Arc::new(
            FileUrlRepository::open(path)
                .await
                .context("Failed to open storage file")?,
        ),
        None => {
            tracing::info!("Using in-memory storage");
            Arc::new(MemoryUrlRepository::new())
        }
    };

    let sinks = init_sinks(&config.audit_config()).context("Failed to set up audit sinks")?;
    let audit = Arc::new(AuditDispatcher::new(sinks, config.audit_queue_capacity));

    let deletion = Arc::new(DeletionPipeline::start(
        config.batch_config(),
        repository.clone(),
        CancellationToken::new(),
    ));

    let link_service = Arc::new(LinkService::new(
        repository.clone(),
        audit.clone(),
        deletion.clone(),
        config.base_url.clone(),
    ));
    let auth_service = Arc::new(AuthService::new(
        config.auth_secret.clone(),
        config.auth_cookie_name.clone(),
    ));

    let state = AppState {
        link_service,
        auth_service,
        audit: audit.clone(),
        deletion: deletion.clone(),
    };

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    let shutdown = shutdown_token();
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("Server stopped, draining background work");
    drain_background(&audit, &deletion, config.shutdown_timeout()).await;

    repository
        .persist()
        .await
        .context("Failed to persist storage")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Shuts the dispatcher and then the deletion pipeline down under one deadline.
///
/// The pipeline gets whatever the dispatcher left of `timeout`.
pub async fn drain_background(
    audit: &AuditDispatcher,
    deletion: &DeletionPipeline,
    timeout: Duration,
) -> Option<ApplyReport> {
    let deadline = Instant::now() + timeout;

    audit.shutdown(timeout).await;

    let report = deletion
        .shutdown(deadline.saturating_duration_since(Instant::now()))
        .await;
    match &report {
        Some(report) => tracing::info!(
            batches = report.batches,
            items = report.items,
            "Deletion pipeline drained"
        ),
        None => tracing::warn!("Deletion pipeline did not drain cleanly"),
    }
    report
}

/// Returns a token cancelled on the first SIGINT or SIGTERM.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        trigger.cancel();
    });

    token
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
