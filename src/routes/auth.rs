use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, RefreshPayload, RegisterPayload},
    error::Result,
    middleware::auth::{bearer_token, CurrentUser},
    AppState,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.auth_service.login(payload).await?;
    Ok(Json(response))
}

/// Works without a body; the session to revoke rides in the bearer header.
/// Revoking twice is fine.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let token = bearer_token(&headers);
    state.auth_service.logout(token.as_deref()).await?;
    Ok(Json(json!({ "message": "Logged out successfully" })))
}

#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let session = state.auth_service.refresh(payload).await?;
    Ok(Json(json!({ "session": session })))
}

/// The session resolver already did the work; this just exposes it.
#[axum::debug_handler]
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Result<impl IntoResponse> {
    Ok(Json(user))
}
