use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use crate::AppState;

/// Liveness plus a cheap store round trip, same shape the deploy checks poll.
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.count("users").await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "connected" })),
        ),
        Err(err) => {
            error!(error = %err, "health check store probe failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error" })),
            )
        }
    }
}
