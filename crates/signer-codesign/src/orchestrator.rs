//! The end-to-end sign workflow.

use crate::app::{AppInfo, read_app};
use crate::archive::ArchiveService;
use crate::error::SignError;
use crate::hash::compute_manifest;
use crate::signature::{SignatureRecord, sign, write_signature_record};
use http::HeaderMap;
use signer_core::SIGNATURE_FILE;
use signer_keys::KeyResolver;
use signer_token::{TokenClaims, TokenService};
use std::sync::Arc;

/// Result of a successful sign request.
#[derive(Debug, Clone)]
pub struct SignedPackage {
    pub app_id: String,
    pub version: String,
    pub record: SignatureRecord,
    /// `<id>-<version>.tar.gz`
    pub archive_name: String,
    /// The re-packed app including its signature record.
    pub archive: Vec<u8>,
}

/// Authenticates, authorizes and signs uploaded app packages.
///
/// Holds only immutable configuration; requests share nothing else.
#[derive(Clone)]
pub struct SigningService {
    tokens: TokenService,
    keys: Arc<dyn KeyResolver>,
    archives: ArchiveService,
}

impl SigningService {
    pub fn new(tokens: TokenService, keys: Arc<dyn KeyResolver>, archives: ArchiveService) -> Self {
        Self {
            tokens,
            keys,
            archives,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Check the request's bearer token. The cause of a rejection is only logged.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<TokenClaims, SignError> {
        self.tokens.authenticate(headers).map_err(|e| {
            tracing::debug!(error = %e, "Authentication failed");
            SignError::Unauthenticated
        })
    }

    /// Sign an uploaded `.tar.gz` package on behalf of the token holder.
    ///
    /// Archive, hashing and signing work runs on the blocking pool.
    pub async fn sign(&self, headers: &HeaderMap, package: &[u8]) -> Result<SignedPackage, SignError> {
        let claims = self.authenticate(headers)?;

        let archives = self.archives.clone();
        let package = package.to_vec();
        // The scratch directory is removed with everything in it when dropped.
        let (scratch, app) = blocking(move || {
            let scratch = archives.temp_dir()?;
            archives.extract(&package, scratch.path())?;
            let app = read_app(scratch.path())?;
            Ok((scratch, app))
        })
        .await?;

        let action = app.sign_action();
        if !self.tokens.is_authorized_to_perform(headers, &action) {
            tracing::warn!(subject = %claims.sub, action = %action, "Sign request not authorized");
            return Err(SignError::Unauthorized { action });
        }

        let record = self.sign_app(&app).await?;

        let archives = self.archives.clone();
        let archive_name = app.archive_name();
        let (app_dir, name) = (app.path.clone(), archive_name.clone());
        let archive = blocking(move || {
            let path = archives.compress(&app_dir, &name)?;
            Ok(std::fs::read(path)?)
        })
        .await?;
        drop(scratch);

        tracing::info!(
            app_id = %app.id,
            version = %app.version,
            subject = %claims.sub,
            files = record.hashes.len(),
            "Signed app"
        );

        Ok(SignedPackage {
            app_id: app.id,
            version: app.version,
            record,
            archive_name,
            archive,
        })
    }

    /// Hash and sign an extracted app, writing its signature record in place.
    pub async fn sign_app(&self, app: &AppInfo) -> Result<SignatureRecord, SignError> {
        let keys = self.keys.resolve_key_set(&app.id).await?;
        let root = app.path.clone();
        blocking(move || {
            let manifest = compute_manifest(&root)?;
            let record = sign(&manifest, &keys)?;
            write_signature_record(&record, &root.join(SIGNATURE_FILE))?;
            Ok(record)
        })
        .await
    }
}

async fn blocking<T, F>(work: F) -> Result<T, SignError>
where
    F: FnOnce() -> Result<T, SignError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SignError::Infrastructure(format!("signing task failed: {}", e)))?
}
