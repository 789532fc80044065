//! Minimal Vault KV client.

use crate::error::KeyError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use signer_core::{VaultAuth, VaultSettings};
use std::time::Duration;

const TOKEN_HEADER: &str = "X-Vault-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Read access to secret entries.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read the entry at `key`. `Ok(None)` means the entry does not exist.
    async fn read(&self, key: &str) -> Result<Option<Map<String, Value>>, KeyError>;
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    auth: LoginAuth,
}

#[derive(Debug, Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    #[serde(default)]
    data: Map<String, Value>,
}

/// HTTP client for a Vault server.
///
/// Logs in on every read; tokens are never cached between calls.
#[derive(Debug, Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    url: String,
    namespace: Option<String>,
    auth: VaultAuth,
}

impl VaultClient {
    pub fn new(settings: &VaultSettings) -> Result<Self, KeyError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("signer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| KeyError::Config(format!("cannot build vault client: {}", e)))?;

        let namespace = settings.namespace.trim_matches('/');

        Ok(Self {
            http,
            url: settings.url.trim_end_matches('/').to_string(),
            namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            auth: settings.auth.clone(),
        })
    }

    /// API path of the secret entry `key`. The key is one path segment.
    pub fn secret_path(&self, key: &str) -> String {
        let key = urlencoding::encode(key);
        match &self.namespace {
            Some(namespace) => format!("/v1/{}/{}", namespace, key),
            None => {
                tracing::warn!("Vault namespace is not set");
                format!("/v1/{}", key)
            }
        }
    }

    fn userpass_login_path(username: &str) -> String {
        format!("/v1/auth/userpass/login/{}", urlencoding::encode(username))
    }

    async fn client_token(&self) -> Result<String, KeyError> {
        let (path, body) = match &self.auth {
            VaultAuth::Token(token) => return Ok(token.clone()),
            VaultAuth::UserPass { username, password } => (
                Self::userpass_login_path(username),
                json!({ "password": password }),
            ),
            VaultAuth::AppRole { role_id, secret_id } => (
                "/v1/auth/approle/login".to_string(),
                json!({ "role_id": role_id, "secret_id": secret_id }),
            ),
        };

        let response = self
            .http
            .post(format!("{}{}", self.url, path))
            .json(&body)
            .send()
            .await
            .map_err(|e| KeyError::Infrastructure(format!("vault login failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(KeyError::Infrastructure(format!(
                "vault login failed: HTTP {}",
                response.status()
            )));
        }

        let login: LoginResponse = response.json().await.map_err(|e| {
            KeyError::Infrastructure(format!("unexpected vault login response: {}", e))
        })?;
        Ok(login.auth.client_token)
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn read(&self, key: &str) -> Result<Option<Map<String, Value>>, KeyError> {
        let token = self.client_token().await?;
        let path = self.secret_path(key);
        tracing::debug!(path = %path, "Reading vault secret");

        let response = self
            .http
            .get(format!("{}{}", self.url, path))
            .header(TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| KeyError::Infrastructure(format!("vault read failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: ReadResponse = response.json().await.map_err(|e| {
                    KeyError::Infrastructure(format!("unexpected vault read response: {}", e))
                })?;
                Ok(Some(body.data))
            }
            status => Err(KeyError::Infrastructure(format!(
                "vault read of {} failed: HTTP {}",
                path, status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(namespace: &str) -> VaultClient {
        VaultClient::new(&VaultSettings {
            url: "http://127.0.0.1:8200".into(),
            namespace: namespace.into(),
            auth: VaultAuth::Token("s.test".into()),
        })
        .unwrap()
    }

    #[test]
    fn test_secret_path_encodes_key() {
        let client = client("/secret/apps/");
        assert_eq!(client.secret_path("theme-example"), "/v1/secret/apps/theme-example");
        assert_eq!(client.secret_path("a?b#c"), "/v1/secret/apps/a%3Fb%23c");
        assert_eq!(client.secret_path("x/../y"), "/v1/secret/apps/x%2F..%2Fy");
    }

    #[test]
    fn test_encoded_key_without_namespace() {
        assert_eq!(client("").secret_path("a b"), "/v1/a%20b");
    }

    #[test]
    fn test_userpass_login_path_encodes_username() {
        assert_eq!(
            VaultClient::userpass_login_path("ops@example.com/x"),
            "/v1/auth/userpass/login/ops%40example.com%2Fx"
        );
    }
}
