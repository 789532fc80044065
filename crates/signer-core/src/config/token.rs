//! Token service configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the bearer token signing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Path to the P-256 private key (PKCS#8 or SEC1 PEM).
    #[serde(default)]
    pub signing_key_file: Option<PathBuf>,

    /// Environment variable containing the PEM-encoded private key.
    #[serde(default)]
    pub signing_key_env: Option<String>,

    /// Key identifier asserted in the token header.
    #[serde(default)]
    pub key_id: Option<String>,

    /// Issuer used when minting tokens from the CLI.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Default token lifetime in seconds for the CLI.
    #[serde(default = "default_validity_secs")]
    pub default_validity_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            signing_key_file: None,
            signing_key_env: None,
            key_id: None,
            issuer: default_issuer(),
            default_validity_secs: default_validity_secs(),
        }
    }
}

impl TokenConfig {
    /// Resolve the signing key PEM from environment or file.
    pub fn resolve_signing_key(&self) -> Result<Option<String>, std::io::Error> {
        // Try environment variable first
        if let Some(env_var) = &self.signing_key_env {
            if let Ok(key) = std::env::var(env_var) {
                return Ok(Some(key));
            }
        }

        if let Some(path) = &self.signing_key_file {
            let key = std::fs::read_to_string(path)?;
            return Ok(Some(key));
        }

        Ok(None)
    }
}

fn default_issuer() -> String {
    "signer-cli".to_string()
}

fn default_validity_secs() -> u64 {
    // ten years
    315_360_000
}
