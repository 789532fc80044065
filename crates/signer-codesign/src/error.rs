//! Error types for the signing workflow.

use signer_keys::KeyError;
use thiserror::Error;

/// Every way a sign request can fail.
#[derive(Debug, Error)]
pub enum SignError {
    /// Token missing, malformed, forged or outside its validity window.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Token is valid but its scope does not grant the action.
    #[error("not authorized to perform '{action}'")]
    Unauthorized { action: String },

    /// Upload could not be extracted.
    #[error("invalid app archive: {0}")]
    InvalidArchive(String),

    /// App descriptor missing, duplicated or incomplete.
    #[error("invalid app: {0}")]
    InvalidApp(String),

    /// No key material is onboarded for the app.
    #[error("no key found for app '{app_id}'")]
    KeyNotFound { app_id: String },

    /// Key material exists but is unusable for the app.
    #[error("invalid key for app '{app_id}': {reason}")]
    InvalidKeyMaterial { app_id: String, reason: String },

    /// Backing store or environment failure.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<KeyError> for SignError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::NotFound { app_id } => SignError::KeyNotFound { app_id },
            KeyError::InvalidKey { app_id, reason } => {
                SignError::InvalidKeyMaterial { app_id, reason }
            }
            KeyError::Infrastructure(msg) | KeyError::Config(msg) => SignError::Infrastructure(msg),
            KeyError::IoError(e) => SignError::IoError(e),
        }
    }
}
