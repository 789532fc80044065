//! Detached signatures over a hash manifest.

use crate::canonical::{to_canonical_json, to_pretty_json};
use crate::error::SignError;
use crate::hash::HashManifest;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::rngs::OsRng;
use rsa::pss::SigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use signer_keys::KeySet;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// PSS salt length. Zero makes signatures reproducible for a given key and manifest.
const SALT_LEN: usize = 0;

/// The persisted `signature.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub hashes: HashManifest,
    /// Standard base64 of the raw RSA-PSS signature.
    pub signature: String,
    /// PEM of the signing certificate.
    pub certificate: String,
}

/// Sign the canonical encoding of `manifest` with the app's key.
///
/// RSA-PSS with SHA-512 and MGF1-SHA-512.
pub fn sign(manifest: &HashManifest, keys: &KeySet) -> Result<SignatureRecord, SignError> {
    let payload = to_canonical_json(manifest)?;

    let signing_key = SigningKey::<Sha512>::new_with_salt_len(keys.private_key().clone(), SALT_LEN);
    let signature = signing_key
        .try_sign_with_rng(&mut OsRng, &payload)
        .map_err(|e| SignError::InvalidKeyMaterial {
            app_id: keys.app_id().to_string(),
            reason: format!("signing failed: {}", e),
        })?;

    let record = SignatureRecord {
        hashes: manifest.clone(),
        signature: BASE64.encode(signature.to_bytes()),
        certificate: keys.certificate_pem()?,
    };

    tracing::debug!(
        app_id = keys.app_id(),
        files = manifest.len(),
        "Signed hash manifest"
    );
    Ok(record)
}

/// Write `record` to `destination` as pretty JSON.
///
/// The content goes to a temporary file in the same directory first and is
/// renamed into place, so readers never see a partial record.
pub fn write_signature_record(record: &SignatureRecord, destination: &Path) -> Result<(), SignError> {
    let parent = destination.parent().ok_or_else(|| {
        SignError::Infrastructure(format!("no parent directory for {}", destination.display()))
    })?;
    std::fs::create_dir_all(parent)?;

    let body = to_pretty_json(record)?;
    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(&body)?;
    file.as_file().sync_all()?;
    file.persist(destination).map_err(|e| SignError::IoError(e.error))?;

    tracing::debug!(path = %destination.display(), "Wrote signature record");
    Ok(())
}
