use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::platform::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Validation failures surface the first declared message as the response
/// body, matching what the forms display.
fn validation_message(errs: &validator::ValidationErrors) -> String {
    errs.field_errors()
        .values()
        .flat_map(|errors| errors.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request payload".to_string())
}

/// Maps a store failure to the status/message pair exposed to the client.
/// Upstream detail stays in the logs; the client only sees the mapped message.
fn translate_store_error(err: &StoreError) -> (StatusCode, String) {
    let code = match err {
        StoreError::Upstream { code, .. } => code.as_deref(),
        _ => None,
    };
    match code {
        Some("42501") => (StatusCode::FORBIDDEN, "Insufficient permissions".to_string()),
        Some("42703") => (
            StatusCode::BAD_REQUEST,
            "Invalid column reference".to_string(),
        ),
        Some("23505") => (StatusCode::CONFLICT, "Duplicate record".to_string()),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database operation failed".to_string(),
        ),
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, validation_message(&err)),
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Store(err) => {
                tracing::error!(error = ?err, "record store operation failed");
                translate_store_error(&err)
            }
            Error::Reqwest(err) => {
                tracing::error!(error = ?err, "platform request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "External service error".to_string(),
                )
            }
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Error::Anyhow(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
