//! Key resolver capability and backend selection.

use crate::error::KeyError;
use crate::file::FileKeyResolver;
use crate::keyset::KeySet;
use crate::vault::VaultClient;
use crate::vault_secret::VaultSecretKeyResolver;
use async_trait::async_trait;
use signer_core::KeyBackend;
use std::sync::Arc;

/// Produces the key set for an app from one configured backend.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Resolve the key set for `app_id`. Each call reads the backend afresh.
    async fn resolve_key_set(&self, app_id: &str) -> Result<KeySet, KeyError>;
}

/// Create the resolver for the configured backend.
pub fn create_resolver(backend: &KeyBackend) -> Result<Arc<dyn KeyResolver>, KeyError> {
    match backend {
        KeyBackend::File { lookup_directory } => {
            tracing::info!(directory = %lookup_directory.display(), "Using file key service");
            Ok(Arc::new(FileKeyResolver::new(lookup_directory)))
        }
        KeyBackend::VaultSecret(settings) => {
            tracing::info!(url = %settings.url, namespace = %settings.namespace, "Using vault key service");
            let client = VaultClient::new(settings)?;
            Ok(Arc::new(VaultSecretKeyResolver::new(client)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signer_core::{VaultAuth, VaultSettings};

    #[tokio::test]
    async fn test_create_file_resolver() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = create_resolver(&KeyBackend::File {
            lookup_directory: dir.path().to_path_buf(),
        })
        .unwrap();

        assert!(matches!(
            resolver.resolve_key_set("missing").await,
            Err(KeyError::NotFound { .. })
        ));
    }

    #[test]
    fn test_create_vault_resolver() {
        let backend = KeyBackend::VaultSecret(VaultSettings {
            url: "http://127.0.0.1:8200".into(),
            namespace: "secret/apps".into(),
            auth: VaultAuth::Token("s.test".into()),
        });
        assert!(create_resolver(&backend).is_ok());
    }
}
