//! The service's own token signing key.

use crate::error::TokenError;
use jsonwebtoken::{DecodingKey, EncodingKey};
use p256::SecretKey;
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use std::path::Path;

/// A P-256 keypair used to sign and verify ES256 tokens.
///
/// Loaded once at startup from configuration; immutable afterwards.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    key_id: Option<String>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Load a keypair from a PKCS#8 or SEC1 PEM-encoded P-256 private key.
    pub fn from_pem(pem: &str) -> Result<Self, TokenError> {
        let pem = pem.trim();
        let secret = SecretKey::from_pkcs8_pem(pem)
            .or_else(|_| SecretKey::from_sec1_pem(pem))
            .map_err(|e| TokenError::InvalidSigningKey(e.to_string()))?;

        // Normalise to PKCS#8 and derive the public half for verification.
        let private_pem = secret
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| TokenError::InvalidSigningKey(e.to_string()))?;
        let public_pem = secret
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| TokenError::InvalidSigningKey(e.to_string()))?;

        let encoding = EncodingKey::from_ec_pem(private_pem.as_bytes())
            .map_err(|e| TokenError::InvalidSigningKey(e.to_string()))?;
        let decoding = DecodingKey::from_ec_pem(public_pem.as_bytes())
            .map_err(|e| TokenError::InvalidSigningKey(e.to_string()))?;

        Ok(Self {
            encoding,
            decoding,
            key_id: None,
        })
    }

    /// Load a keypair from a PEM file.
    pub fn load_from_file(path: &Path) -> Result<Self, TokenError> {
        let pem = std::fs::read_to_string(path)?;
        Self::from_pem(&pem)
    }

    /// Assert `kid` in issued token headers and require it on verification.
    pub fn with_key_id(mut self, key_id: Option<String>) -> Self {
        self.key_id = key_id;
        self
    }

    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}
