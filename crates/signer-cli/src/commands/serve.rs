//! `signer serve` - Start the HTTP signing service.

use anyhow::Context;
use signer_core::SignerConfig;
use signer_server::{AppState, SignerServer};

pub async fn run(config: SignerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).context("Failed to initialize signing service")?;

    tracing::info!(
        workspace = %config.workspace.display(),
        max_upload_bytes = config.server.max_upload_bytes,
        "Starting signer"
    );

    SignerServer::new(config.server, state)
        .run()
        .await
        .context("Signer server failed")
}
