//! RelayQ Server - HTTP send gateway for Azure Service Bus
//!
//! This is the main entry point for the RelayQ gateway.

mod api;
mod config;

use std::sync::Arc;

use anyhow::Context;
use relayq_core::Gateway;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{create_router, AppState, SEND_PATH};
use crate::config::{Config, LogFormat};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "relayq_server=debug,relayq_core=debug,relayq_broker=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// ==================== Main ====================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    // Initialize logging
    init_tracing(config.log_format);
    info!(broker = ?config.broker, "Configuration loaded");

    // One sender for the lifetime of the process
    let sender = config.broker.connect()?;
    let gateway = Arc::new(Gateway::with_sender(sender));

    // Create app state
    let state = AppState { gateway };

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    let addr = listener.local_addr()?;

    info!("RelayQ server listening on {}", addr);
    info!("Send endpoint: POST http://{}{}", addr, SEND_PATH);
    info!("Swagger UI: http://{}/swagger-ui/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
