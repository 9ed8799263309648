//! HubBridge - platform notifications to Azure Event Hubs
//!
//! Main entry point for the bridge process.

use anyhow::Context;
use hubbridge_app::utils::{init_logging, shutdown_signal, LogFormat};
use hubbridge_app::AppContext;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before logging so RUST_LOG and the log format apply
    let dotenv = dotenvy::dotenv();
    init_logging(LogFormat::from_env())?;

    match dotenv {
        Ok(path) => info!("Loaded .env from: {:?}", path),
        Err(e) => warn!("Could not load .env file: {}", e),
    }

    let config = hubbridge_infra::config::load().context("failed to load configuration")?;
    let context = AppContext::new(config).await.context("bridge startup failed")?;
    info!(
        health = %context.health_addr(),
        forwarding = context.is_forwarding(),
        "HubBridge initialized successfully"
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.cancel();
    });

    context.run(cancel).await.context("bridge shutdown failed")?;
    Ok(())
}
