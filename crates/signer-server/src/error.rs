//! Error types for the server crate.

use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use signer_codesign::SignError;
use signer_keys::KeyError;
use signer_token::TokenError;
use thiserror::Error;

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind or serve.
    #[error("failed to start server: {0}")]
    StartupFailed(String),

    /// The token signing key could not be loaded.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The key backend could not be constructed.
    #[error(transparent)]
    Keys(#[from] KeyError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors returned to HTTP clients as `{"error": ..., "code": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upload missing, duplicated or unreadable.
    #[error("{0}")]
    BadRequest(String),

    /// Upload exceeds `server.max_upload_bytes`.
    #[error("upload too large")]
    PayloadTooLarge,

    /// No route for the path.
    #[error("not found")]
    NotFound,

    /// Route exists but not for this method.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Failure from the sign workflow.
    #[error(transparent)]
    Sign(#[from] SignError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Sign(err) => match err {
                SignError::Unauthenticated => StatusCode::UNAUTHORIZED,
                SignError::Unauthorized { .. } => StatusCode::FORBIDDEN,
                SignError::InvalidArchive(_) | SignError::InvalidApp(_) => StatusCode::BAD_REQUEST,
                SignError::KeyNotFound { .. } => StatusCode::NOT_FOUND,
                SignError::InvalidKeyMaterial { .. }
                | SignError::Infrastructure(_)
                | SignError::SerializationError(_)
                | SignError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    // Server-side failures are logged in full and reported generically.
    fn public_message(&self) -> String {
        match self {
            ApiError::Sign(SignError::InvalidKeyMaterial { .. })
            | ApiError::Sign(SignError::Infrastructure(_))
            | ApiError::Sign(SignError::SerializationError(_))
            | ApiError::Sign(SignError::IoError(_)) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = Json(json!({
            "error": self.public_message(),
            "code": status.as_u16(),
        }));
        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
