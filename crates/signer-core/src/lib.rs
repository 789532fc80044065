// Configuration types shared across all signer crates
pub mod config;

pub use config::{
    CONFIG_PATH_ENV, ConfigError, KeyBackend, KeyServiceConfig, ServerConfig, SignerConfig,
    TokenConfig, VaultAuth, VaultSettings,
};

/// Audience asserted in every token issued by this service.
pub const SERVICE_NAME: &str = "signer";

/// Location of the signature record relative to the app root.
pub const SIGNATURE_FILE: &str = "appinfo/signature.json";

/// Location of the app descriptor relative to the app root.
pub const APP_INFO_FILE: &str = "appinfo/info.xml";
