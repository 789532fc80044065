//! Key service backend configuration.
//!
//! Exactly one backend is configured per deployment:
//!
//! ```yaml
//! keyservice:
//!   file:
//!     lookup_directory: /etc/signer/keys
//! ```
//!
//! or
//!
//! ```yaml
//! keyservice:
//!   vault_secret:
//!     url: https://vault.example.com
//!     namespace: secret/apps
//!     auth:
//!       role: { id: my-role, secret: my-secret }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

/// Raw key service section as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KeyServiceConfig {
    /// Look up `<app>.key` / `<app>.crt` in a directory.
    #[serde(default)]
    pub file: Option<FileKeyServiceConfig>,

    /// Read key material from a Vault secret.
    #[serde(default)]
    pub vault_secret: Option<VaultSecretConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileKeyServiceConfig {
    /// Directory holding `<app>.key` and `<app>.crt`.
    pub lookup_directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSecretConfig {
    /// Base URL of the Vault server.
    #[serde(default)]
    pub url: Option<String>,

    /// Secret path prefix below `/v1/`.
    #[serde(default)]
    pub namespace: String,

    /// Authentication method (exactly one).
    #[serde(default)]
    pub auth: VaultAuthConfig,
}

/// Raw Vault authentication section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VaultAuthConfig {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,

    #[serde(default)]
    pub role: Option<AppRoleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppRoleConfig {
    pub id: String,
    pub secret: String,
}

/// The validated backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyBackend {
    File { lookup_directory: PathBuf },
    VaultSecret(VaultSettings),
}

/// Validated Vault connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSettings {
    pub url: String,
    pub namespace: String,
    pub auth: VaultAuth,
}

/// Validated Vault authentication method.
#[derive(Clone, PartialEq, Eq)]
pub enum VaultAuth {
    Token(String),
    UserPass { username: String, password: String },
    AppRole { role_id: String, secret_id: String },
}

impl std::fmt::Debug for VaultAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print secrets
        match self {
            VaultAuth::Token(_) => f.write_str("Token(..)"),
            VaultAuth::UserPass { username, .. } => {
                f.debug_struct("UserPass").field("username", username).finish_non_exhaustive()
            }
            VaultAuth::AppRole { role_id, .. } => {
                f.debug_struct("AppRole").field("role_id", role_id).finish_non_exhaustive()
            }
        }
    }
}

impl KeyServiceConfig {
    /// Validate the section and return the selected backend.
    pub fn backend(&self) -> Result<KeyBackend, ConfigError> {
        match (&self.file, &self.vault_secret) {
            (Some(_), Some(_)) => Err(ConfigError::Config(
                "only one keyservice can be configured".into(),
            )),
            (None, None) => Err(ConfigError::Config(
                "at least one keyservice must be configured".into(),
            )),
            (Some(file), None) => {
                if file.lookup_directory.as_os_str().is_empty() {
                    return Err(ConfigError::Config(
                        "keyservice.file.lookup_directory must not be empty".into(),
                    ));
                }
                Ok(KeyBackend::File {
                    lookup_directory: file.lookup_directory.clone(),
                })
            }
            (None, Some(vault)) => Ok(KeyBackend::VaultSecret(vault.settings()?)),
        }
    }
}

impl VaultSecretConfig {
    fn settings(&self) -> Result<VaultSettings, ConfigError> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConfigError::Config("missing url for vault client".into()))?;

        Ok(VaultSettings {
            url: url.trim_end_matches('/').to_string(),
            namespace: self.namespace.clone(),
            auth: self.auth.method()?,
        })
    }
}

impl VaultAuthConfig {
    fn method(&self) -> Result<VaultAuth, ConfigError> {
        let configured = [
            self.token.is_some(),
            self.credentials.is_some(),
            self.role.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        if configured == 0 {
            return Err(ConfigError::Config(
                "at least one authentication method needs to be set".into(),
            ));
        }
        if configured > 1 {
            return Err(ConfigError::Config(
                "only one authentication method can be configured".into(),
            ));
        }

        if let Some(token) = &self.token {
            return non_empty(token, "auth.token").map(VaultAuth::Token);
        }
        if let Some(credentials) = &self.credentials {
            return Ok(VaultAuth::UserPass {
                username: non_empty(&credentials.username, "auth.credentials.username")?,
                password: non_empty(&credentials.password, "auth.credentials.password")?,
            });
        }
        let role = self.role.as_ref().ok_or_else(|| {
            ConfigError::Config("unknown authentication strategy".into())
        })?;
        Ok(VaultAuth::AppRole {
            role_id: non_empty(&role.id, "auth.role.id")?,
            secret_id: non_empty(&role.secret, "auth.role.secret")?,
        })
    }
}

fn non_empty(value: &str, field: &str) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Config(format!("{} cannot be empty", field)));
    }
    Ok(value.to_string())
}
