use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{dto::customer_dto::CustomerPayload, error::Result, AppState};

#[axum::debug_handler]
pub async fn list_customers(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let customers = state.customer_service.list().await?;
    Ok(Json(customers))
}

#[axum::debug_handler]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let customer = state.customer_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

#[axum::debug_handler]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let customer = state.customer_service.update(id, payload).await?;
    Ok(Json(customer))
}

#[axum::debug_handler]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.customer_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
