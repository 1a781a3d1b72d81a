//! HTTP server with graceful shutdown

use crate::api::create_router;
use crate::service::AppState;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// Where the server listens
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Serves the API router until told to stop
pub struct HttpServer {
    config: HttpServerConfig,
    state: AppState,
    shutdown_tx: watch::Sender<bool>,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid HTTP server address")?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!("HTTP server listening on http://{}", listener.local_addr()?);
        Ok(listener)
    }

    /// Serve on an already bound listener until `stop` is called
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let app = create_router(self.state.clone());
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                // A stop sent before we subscribed is still observed
                let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Ask a running `serve` to finish in-flight requests and return
    pub fn stop(&self) {
        info!("Stopping HTTP server...");

        if self.shutdown_tx.send_replace(true) {
            warn!("HTTP server was already stopping");
        }
    }
}
