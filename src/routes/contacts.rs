use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{dto::contact_dto::ContactPayload, error::Result, AppState};

#[axum::debug_handler]
pub async fn list_contacts(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let contacts = state.contact_service.list().await?;
    Ok(Json(contacts))
}

#[axum::debug_handler]
pub async fn create_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let contact = state.contact_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

#[axum::debug_handler]
pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContactPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let contact = state.contact_service.update(id, payload).await?;
    Ok(Json(contact))
}

#[axum::debug_handler]
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.contact_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
