//! Health endpoint server
//!
//! Serves `GET /health` for the hosting platform's liveness probe.

use std::net::SocketAddr;

use axum::routing::get;
use axum::{Json, Router};
use hubbridge_domain::{BridgeError, Result, ServerConfig};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Body of the health response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "UP" })
}

/// Router with the health route.
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Background HTTP server exposing [`router`].
pub struct HealthServer {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl HealthServer {
    /// Bind `host:port` and start serving. Port 0 picks an ephemeral port.
    pub async fn start(config: &ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind((config.host.as_str(), config.port)).await.map_err(|err| {
            BridgeError::Network(format!(
                "failed to bind health server on {}:{}: {err}",
                config.host, config.port
            ))
        })?;

        let local_addr = listener
            .local_addr()
            .map_err(|err| BridgeError::Network(format!("failed to determine port: {err}")))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router())
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("Health server error: {}", err);
            }
        });

        info!(%local_addr, "Health server listening");
        Ok(Self { local_addr, shutdown_tx: Some(shutdown_tx), handle: Some(handle) })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shut down the server gracefully.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    return Err(BridgeError::Internal(format!("health server panicked: {err}")));
                }
            }
        }

        info!("Health server stopped");
        Ok(())
    }
}

impl Drop for HealthServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
