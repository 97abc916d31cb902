use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::user_dto::{CreateUserPayload, UpdateUserPayload},
    error::Result,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Directory projection of all users"),
        (status = 401, description = "Unresolved session")
    )
)]
#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let users = state.user_service.list().await?;
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/users",
    responses(
        (status = 201, description = "User provisioned"),
        (status = 400, description = "Invalid payload"),
        (status = 500, description = "Provisioning failed")
    )
)]
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.update(id, payload).await?;
    Ok(Json(user))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}/toggle-status",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Updated user row"),
        (status = 404, description = "No such user")
    )
)]
#[axum::debug_handler]
pub async fn toggle_user_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.toggle_status(id).await?;
    Ok(Json(user))
}
