//! Serve command: runs the HTTP API until Ctrl-C.

use crate::api::{self, AppState};
use crate::config::Config;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Runs the search API and landing page.
pub struct ServeCommand {
    config: Config,
}

impl ServeCommand {
    /// Creates a new serve command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Binds the configured address and serves until shutdown.
    pub async fn execute(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.bind))?;
        let addr = listener.local_addr().context("Failed to read bound address")?;

        self.serve(listener, addr).await
    }

    async fn serve(&self, listener: TcpListener, addr: SocketAddr) -> Result<()> {
        if !self.config.index_path.exists() {
            warn!("Index page {} not found; / will return 404", self.config.index_path.display());
        }

        let state = AppState::from_config(&self.config);
        let app = api::router(state, &self.config.index_path, &self.config.static_dir);

        info!(
            "Serving on {} ({} renderer, up to {} pages)",
            addr, self.config.renderer, self.config.max_pages
        );
        info!("Open http://127.0.0.1:{}/ in your browser", addr.port());

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
