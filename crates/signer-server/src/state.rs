//! Shared, immutable request state.

use crate::error::ServerError;
use signer_codesign::{ArchiveService, SigningService};
use signer_core::SignerConfig;
use signer_keys::create_resolver;
use signer_token::TokenService;

/// Everything a request handler needs. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub service: SigningService,
}

impl AppState {
    pub fn new(service: SigningService) -> Self {
        Self { service }
    }

    /// Assemble the signing service from validated configuration.
    pub fn from_config(config: &SignerConfig) -> Result<Self, ServerError> {
        let tokens = TokenService::from_config(&config.token)?;
        let backend = config
            .key_backend()
            .map_err(|e| ServerError::StartupFailed(e.to_string()))?;
        let keys = create_resolver(&backend)?;
        let archives = ArchiveService::new(&config.workspace);

        Ok(Self::new(SigningService::new(tokens, keys, archives)))
    }
}
