//! Vault client and secret-backed resolver against a mock server.

use serde_json::json;
use signer_core::{KeyBackend, VaultAuth, VaultSettings};
use signer_keys::{KeyError, KeyResolver, SecretStore, VaultClient, create_resolver};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = include_str!("../../../testdata/theme-example.key");
const CERT: &str = include_str!("../../../testdata/theme-example.crt");
const OTHER_CERT: &str = include_str!("../../../testdata/other-app.crt");

fn settings(server: &MockServer, namespace: &str, auth: VaultAuth) -> VaultSettings {
    VaultSettings {
        url: server.uri(),
        namespace: namespace.to_string(),
        auth,
    }
}

fn secret(key: &str, cert: &str) -> serde_json::Value {
    json!({
        "request_id": "8d2f0e4a",
        "lease_duration": 2764800,
        "data": { "key": key, "cert": cert }
    })
}

#[tokio::test]
async fn test_token_auth_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/apps/theme-example"))
        .and(header("X-Vault-Token", "s.static"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret(KEY, CERT)))
        .expect(1)
        .mount(&server)
        .await;

    let client = VaultClient::new(&settings(
        &server,
        "/secret/apps/",
        VaultAuth::Token("s.static".into()),
    ))
    .unwrap();

    let data = client.read("theme-example").await.unwrap().unwrap();
    assert_eq!(data["cert"], CERT);
}

#[tokio::test]
async fn test_userpass_login_then_read() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/userpass/login/signer"))
        .and(body_json(json!({ "password": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "auth": { "client_token": "s.user" } })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/theme-example"))
        .and(header("X-Vault-Token", "s.user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret(KEY, CERT)))
        .expect(1)
        .mount(&server)
        .await;

    let client = VaultClient::new(&settings(
        &server,
        "secret",
        VaultAuth::UserPass {
            username: "signer".into(),
            password: "hunter2".into(),
        },
    ))
    .unwrap();

    assert!(client.read("theme-example").await.unwrap().is_some());
}

#[tokio::test]
async fn test_approle_login_then_read() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/approle/login"))
        .and(body_json(json!({ "role_id": "role", "secret_id": "secret" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "auth": { "client_token": "s.role" } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/theme-example"))
        .and(header("X-Vault-Token", "s.role"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret(KEY, CERT)))
        .mount(&server)
        .await;

    let client = VaultClient::new(&settings(
        &server,
        "secret",
        VaultAuth::AppRole {
            role_id: "role".into(),
            secret_id: "secret".into(),
        },
    ))
    .unwrap();

    assert!(client.read("theme-example").await.unwrap().is_some());
}

#[tokio::test]
async fn test_login_failure_is_infrastructure_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/approle/login"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = VaultClient::new(&settings(
        &server,
        "secret",
        VaultAuth::AppRole {
            role_id: "role".into(),
            secret_id: "wrong".into(),
        },
    ))
    .unwrap();

    assert!(matches!(
        client.read("theme-example").await,
        Err(KeyError::Infrastructure(_))
    ));
}

#[test]
fn test_secret_path_without_namespace() {
    let client = VaultClient::new(&VaultSettings {
        url: "http://127.0.0.1:8200/".into(),
        namespace: "/".into(),
        auth: VaultAuth::Token("t".into()),
    })
    .unwrap();
    assert_eq!(client.secret_path("app"), "/v1/app");
}

// ---------- resolver through the factory ----------

fn vault_resolver(server: &MockServer) -> Arc<dyn KeyResolver> {
    create_resolver(&KeyBackend::VaultSecret(settings(
        server,
        "secret/apps",
        VaultAuth::Token("s.static".into()),
    )))
    .unwrap()
}

#[tokio::test]
async fn test_resolver_not_found_on_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "errors": [] })))
        .mount(&server)
        .await;

    assert!(matches!(
        vault_resolver(&server).resolve_key_set("theme-example").await,
        Err(KeyError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_resolver_infrastructure_error_on_500() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(matches!(
        vault_resolver(&server).resolve_key_set("theme-example").await,
        Err(KeyError::Infrastructure(_))
    ));
}

#[tokio::test]
async fn test_resolver_rejects_foreign_certificate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/apps/theme-example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret(KEY, OTHER_CERT)))
        .mount(&server)
        .await;

    assert!(matches!(
        vault_resolver(&server).resolve_key_set("theme-example").await,
        Err(KeyError::InvalidKey { .. })
    ));
}

#[tokio::test]
async fn test_resolver_returns_key_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/apps/theme-example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret(KEY, CERT)))
        .mount(&server)
        .await;

    let keys = vault_resolver(&server)
        .resolve_key_set("theme-example")
        .await
        .unwrap();
    assert_eq!(keys.app_id(), "theme-example");
}

#[tokio::test]
async fn test_read_key_is_a_single_encoded_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/apps/app%3Fversion%3D1%23x"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = VaultClient::new(&settings(
        &server,
        "secret/apps",
        VaultAuth::Token("s.static".into()),
    ))
    .unwrap();

    assert!(client.read("app?version=1#x").await.unwrap().is_none());
}
