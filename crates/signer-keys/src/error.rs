//! Error types for the key resolver crate.

use thiserror::Error;

/// Errors that can occur while resolving an app's key set.
///
/// `NotFound` means the app is not onboarded; `InvalidKey` means it is but
/// its material is unusable. Callers map the two differently.
#[derive(Debug, Error)]
pub enum KeyError {
    /// No key material exists for the app.
    #[error("no key found for app '{app_id}'")]
    NotFound { app_id: String },

    /// Key material exists but cannot be used for this app.
    #[error("invalid key for app '{app_id}': {reason}")]
    InvalidKey { app_id: String, reason: String },

    /// Unexpected failure talking to the backing store.
    #[error("key store error: {0}")]
    Infrastructure(String),

    /// Backend could not be constructed from configuration.
    #[error("key service configuration error: {0}")]
    Config(String),

    /// IO error (reading key files).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl KeyError {
    pub fn not_found(app_id: impl Into<String>) -> Self {
        Self::NotFound {
            app_id: app_id.into(),
        }
    }

    pub fn invalid(app_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            app_id: app_id.into(),
            reason: reason.into(),
        }
    }
}
