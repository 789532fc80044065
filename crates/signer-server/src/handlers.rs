//! HTTP request handlers.

use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;

const ARCHIVE_CONTENT_TYPE: &str = "application/gzip";

/// `POST /sign`: sign the single uploaded package and return it re-packed.
pub async fn sign(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    // Unauthenticated callers learn nothing about their upload.
    state.service.authenticate(&headers)?;

    let mut multipart = multipart.map_err(|e| upload_error(e.status(), e.body_text()))?;
    let package = single_file(&mut multipart).await?;

    let signed = state.service.sign(&headers, &package).await?;

    let disposition = format!("inline; filename=\"{}\"", signed.archive_name);
    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, ARCHIVE_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        Body::from(signed.archive),
    )
        .into_response())
}

async fn single_file(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e.status(), e.body_text()))?
    {
        if field.file_name().is_none() {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error(e.status(), e.body_text()))?;
        files.push(bytes);
    }

    if files.len() != 1 {
        return Err(ApiError::BadRequest(format!(
            "expected exactly one uploaded file, got {}",
            files.len()
        )));
    }
    let file = files.remove(0);
    if file.is_empty() {
        return Err(ApiError::BadRequest("uploaded file is empty".into()));
    }
    Ok(file.to_vec())
}

// Body-limit violations keep their 413; every other upload failure is a bad request.
fn upload_error(status: StatusCode, message: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest(message)
    }
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
