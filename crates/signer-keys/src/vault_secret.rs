//! Key sets stored as Vault secrets with `key` and `cert` fields.

use crate::error::KeyError;
use crate::keyset::KeySet;
use crate::resolver::KeyResolver;
use crate::vault::SecretStore;
use async_trait::async_trait;
use serde_json::{Map, Value};

const KEY_FIELD: &str = "key";
const CERT_FIELD: &str = "cert";

/// Resolves key sets from a secret store entry named after the app.
///
/// The certificate subject CN must equal the app id.
pub struct VaultSecretKeyResolver<S> {
    store: S,
}

impl<S: SecretStore> VaultSecretKeyResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

fn field<'a>(data: &'a Map<String, Value>, app_id: &str, name: &str) -> Result<&'a str, KeyError> {
    match data.get(name) {
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(_) => Err(KeyError::invalid(app_id, format!("field '{}' is not a string", name))),
        None => {
            tracing::debug!(app_id, field = name, "Secret entry lacks field");
            Err(KeyError::not_found(app_id))
        }
    }
}

#[async_trait]
impl<S: SecretStore> KeyResolver for VaultSecretKeyResolver<S> {
    async fn resolve_key_set(&self, app_id: &str) -> Result<KeySet, KeyError> {
        let Some(data) = self.store.read(app_id).await? else {
            tracing::debug!(app_id, "No secret entry for app");
            return Err(KeyError::not_found(app_id));
        };

        let key_pem = field(&data, app_id, KEY_FIELD)?;
        let cert_pem = field(&data, app_id, CERT_FIELD)?;

        let keys = KeySet::from_pem(app_id, key_pem, cert_pem)?;
        keys.ensure_common_name()?;

        tracing::debug!(app_id, "Resolved key set from secret store");
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    const KEY: &str = include_str!("../../../testdata/theme-example.key");
    const CERT: &str = include_str!("../../../testdata/theme-example.crt");
    const OTHER_CERT: &str = include_str!("../../../testdata/other-app.crt");

    /// In-memory store; `fail` simulates an unreachable backend.
    #[derive(Default)]
    struct MemoryStore {
        entries: HashMap<String, Value>,
        fail: bool,
    }

    impl MemoryStore {
        fn with(app_id: &str, entry: Value) -> Self {
            Self {
                entries: HashMap::from([(app_id.to_string(), entry)]),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl SecretStore for MemoryStore {
        async fn read(&self, key: &str) -> Result<Option<Map<String, Value>>, KeyError> {
            if self.fail {
                return Err(KeyError::Infrastructure("connection refused".into()));
            }
            Ok(self
                .entries
                .get(key)
                .and_then(|v| v.as_object().cloned()))
        }
    }

    #[tokio::test]
    async fn test_resolves_matching_entry() {
        let store = MemoryStore::with("theme-example", json!({"key": KEY, "cert": CERT}));
        let keys = VaultSecretKeyResolver::new(store)
            .resolve_key_set("theme-example")
            .await
            .unwrap();
        assert_eq!(keys.common_name().as_deref(), Some("theme-example"));
    }

    #[tokio::test]
    async fn test_missing_entry_is_not_found() {
        let resolver = VaultSecretKeyResolver::new(MemoryStore::default());
        assert!(matches!(
            resolver.resolve_key_set("theme-example").await,
            Err(KeyError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_fields_are_not_found() {
        for entry in [json!({"cert": CERT}), json!({"key": KEY}), json!({})] {
            let resolver = VaultSecretKeyResolver::new(MemoryStore::with("theme-example", entry));
            assert!(matches!(
                resolver.resolve_key_set("theme-example").await,
                Err(KeyError::NotFound { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_common_name_mismatch_is_invalid() {
        let store = MemoryStore::with("theme-example", json!({"key": KEY, "cert": OTHER_CERT}));
        assert!(matches!(
            VaultSecretKeyResolver::new(store)
                .resolve_key_set("theme-example")
                .await,
            Err(KeyError::InvalidKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_material_is_invalid() {
        let store = MemoryStore::with("theme-example", json!({"key": "nope", "cert": CERT}));
        assert!(matches!(
            VaultSecretKeyResolver::new(store)
                .resolve_key_set("theme-example")
                .await,
            Err(KeyError::InvalidKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        assert!(matches!(
            VaultSecretKeyResolver::new(store)
                .resolve_key_set("theme-example")
                .await,
            Err(KeyError::Infrastructure(_))
        ));
    }
}
