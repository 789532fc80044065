//! Server startup and shutdown.

use crate::error::ServerError;
use crate::routes;
use crate::state::AppState;
use signer_core::ServerConfig;
use std::sync::Arc;
use tokio::net::TcpListener;

/// The signing HTTP server.
pub struct SignerServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl SignerServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Serve until interrupted.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = routes::create_router(self.state, self.config.max_upload_bytes);

        let listener = TcpListener::bind(&self.config.bind).await.map_err(|e| {
            ServerError::StartupFailed(format!("failed to bind {}: {}", self.config.bind, e))
        })?;
        tracing::info!(address = %self.config.bind, "Signer listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::StartupFailed(e.to_string()))?;

        tracing::info!("Signer stopped");
        Ok(())
    }

    pub fn bind_address(&self) -> &str {
        &self.config.bind
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
