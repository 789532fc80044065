//! Key sets stored as `<app>.key` / `<app>.crt` files in one directory.

use crate::error::KeyError;
use crate::keyset::KeySet;
use crate::resolver::KeyResolver;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const KEY_EXTENSION: &str = "key";
const CERT_EXTENSION: &str = "crt";

/// Resolves key sets from a lookup directory.
///
/// The certificate subject is not checked against the app id; whoever
/// provisions the directory is trusted to name files correctly.
#[derive(Debug, Clone)]
pub struct FileKeyResolver {
    lookup_directory: PathBuf,
}

impl FileKeyResolver {
    pub fn new(lookup_directory: impl Into<PathBuf>) -> Self {
        Self {
            lookup_directory: lookup_directory.into(),
        }
    }

    pub fn lookup_directory(&self) -> &Path {
        &self.lookup_directory
    }

    fn path_for(&self, app_id: &str, extension: &str) -> PathBuf {
        self.lookup_directory
            .join(format!("{}.{}", app_id, extension))
    }
}

#[async_trait]
impl KeyResolver for FileKeyResolver {
    async fn resolve_key_set(&self, app_id: &str) -> Result<KeySet, KeyError> {
        // App ids name files directly; never let one walk out of the directory.
        if app_id.is_empty() || app_id.contains(['/', '\\']) || app_id.starts_with('.') {
            tracing::warn!(app_id, "Refusing key lookup for unsafe app id");
            return Err(KeyError::not_found(app_id));
        }

        let key_path = self.path_for(app_id, KEY_EXTENSION);
        let cert_path = self.path_for(app_id, CERT_EXTENSION);

        if !key_path.is_file() || !cert_path.is_file() {
            tracing::debug!(
                app_id,
                key = %key_path.display(),
                cert = %cert_path.display(),
                "Key files not present"
            );
            return Err(KeyError::not_found(app_id));
        }

        let key_pem = std::fs::read_to_string(&key_path)?;
        let cert_pem = std::fs::read_to_string(&cert_path)?;

        let keys = KeySet::from_pem(app_id, &key_pem, &cert_pem)?;
        tracing::debug!(app_id, "Resolved key set from files");
        Ok(keys)
    }
}
