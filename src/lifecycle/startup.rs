//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when configured
//! - Build the server and its GitHub client
//! - Bind the listener last, so traffic only arrives once everything is ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Missing secrets are not startup errors; the health endpoint reports them

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::SaverConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics::init_metrics;
use crate::remote::RemoteError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("remote client error: {0}")]
    Remote(#[from] RemoteError),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Start every subsystem and serve until a termination signal arrives.
pub async fn run(config: SaverConfig) -> Result<(), StartupError> {
    if let Some(raw) = &config.observability.metrics_address {
        let addr: SocketAddr = raw
            .parse()
            .map_err(|_| StartupError::MetricsAddress(raw.clone()))?;
        init_metrics(addr);
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        repo = config.remote.repo.as_deref().unwrap_or("<unset>"),
        file_path = %config.remote.file_path,
        allowed_origins = config.cors.allowed_origins.len(),
        max_content_size = config.limits.max_content_size,
        "Configuration loaded"
    );

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let signals = shutdown.trigger_on_signal();

    server.run(listener, shutdown.subscribe()).await?;
    signals.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
