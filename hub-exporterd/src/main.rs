mod api;
mod config;
mod error;
mod hub;
mod metrics;
mod poller;
mod translate;

use std::sync::Arc;
use anyhow::{Context, Result};
use prometheus::Registry;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use crate::config::{Config, CREDENTIAL_ENV};
use crate::hub::discovery::DiscoveryResolver;
use crate::metrics::registry::{register_build_info, HubMetrics};
use crate::poller::Poller;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hub_exporterd=info"))
        )
        .init();

    tracing::info!("Starting hub-exporterd {}", env!("CARGO_PKG_VERSION"));

    // Load config
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/hub-exporter/exporterd.toml".to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    tracing::info!("Loaded config from {}", config_path);

    let credential = config.credential(std::env::var(CREDENTIAL_ENV).ok())?;

    // Metrics are registered on a registry owned here and handed to each component
    let registry = Registry::new();
    let metrics = Arc::new(HubMetrics::register(&registry, &config.metrics.namespace)?);
    register_build_info(&registry, &config.metrics.namespace, env!("CARGO_PKG_VERSION"))?;

    let http = hub::http_client(config.hub.request_timeout())?;
    let resolver = DiscoveryResolver::new(http.clone(), config.hub.discovery_url.clone(), metrics.clone());

    let poller = Poller::start(
        &resolver,
        http,
        credential,
        metrics.clone(),
        metrics.clone(),
        config.poll.interval(),
    )
    .await?;

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    let app_state = api::routes::AppState {
        registry,
        hub: Arc::new(poller.client().hub().clone()),
    };
    let app = api::routes::router(app_state);

    // Bind HTTP server
    let listener = tokio::net::TcpListener::bind(&config.metrics.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.metrics.listen))?;

    tracing::info!("Metrics listening on {}", config.metrics.listen);

    let poller_handle = tokio::spawn(poller.run(cancel.clone()));

    // Run server with graceful shutdown
    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    shutdown_signal().await?;

    // Trigger cancellation
    cancel.cancel();

    // Wait for all tasks to complete
    let _ = tokio::join!(poller_handle, server_handle);

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM, whichever arrives first
async fn shutdown_signal() -> Result<()> {
    let mut terminate = signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for ctrl-c")?;
            tracing::info!("Received ctrl-c, shutting down");
        }
        _ = terminate.recv() => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }

    Ok(())
}
