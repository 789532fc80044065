//! # signer-keys
//!
//! Resolution of per-app signing key material.
//!
//! One backend is selected at startup from configuration:
//!
//! | Backend | Lookup | CN check |
//! |---------|--------|----------|
//! | `file` | `<dir>/<app>.key`, `<dir>/<app>.crt` | no |
//! | `vault_secret` | secret `<namespace>/<app>` with `key` and `cert` | yes |
//!
//! Every call reads the backend afresh; key sets are never cached.

pub mod error;
pub mod file;
pub mod keyset;
pub mod resolver;
pub mod vault;
pub mod vault_secret;

pub use error::KeyError;
pub use file::FileKeyResolver;
pub use keyset::KeySet;
pub use resolver::{KeyResolver, create_resolver};
pub use vault::{SecretStore, VaultClient};
pub use vault_secret::VaultSecretKeyResolver;
