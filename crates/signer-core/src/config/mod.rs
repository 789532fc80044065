//! Configuration types for the app signing service.
//!
//! The whole service is configured from a single YAML file (`signer.yaml` by
//! default) which is loaded once at startup and never mutated afterwards.
//!
//! # Sections
//!
//! - **server**: HTTP bind address and upload limit
//! - **workspace**: base directory for temporary extraction directories
//! - **token**: the service's own bearer-token signing key
//! - **keyservice**: where per-app signing keys are resolved from

pub mod keyservice;
pub mod token;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use keyservice::{
    AppRoleConfig, CredentialsConfig, FileKeyServiceConfig, KeyBackend, KeyServiceConfig,
    VaultAuth, VaultAuthConfig, VaultSecretConfig, VaultSettings,
};
pub use token::TokenConfig;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "SIGNER_CONFIG";

/// Complete signer configuration loaded from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Base directory for extracted packages.
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    /// Bearer token settings.
    #[serde(default)]
    pub token: TokenConfig,

    /// Per-app key material backend.
    #[serde(default)]
    pub keyservice: KeyServiceConfig,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            workspace: default_workspace(),
            token: TokenConfig::default(),
            keyservice: KeyServiceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Largest accepted upload in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_workspace() -> PathBuf {
    std::env::temp_dir().join("signer")
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SignerConfig {
    /// Load configuration from a YAML file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading configuration");
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config path from an explicit argument, `SIGNER_CONFIG`, or the default.
    pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
        if let Some(p) = explicit {
            return p;
        }
        if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(p);
        }
        PathBuf::from("signer.yaml")
    }

    /// Check the invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workspace.as_os_str().is_empty() {
            return Err(ConfigError::Config("workspace cannot be empty".into()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Config(
                "server.max_upload_bytes must be positive".into(),
            ));
        }
        self.keyservice.backend()?;
        Ok(())
    }

    /// The validated key backend selection.
    pub fn key_backend(&self) -> Result<KeyBackend, ConfigError> {
        self.keyservice.backend()
    }
}
