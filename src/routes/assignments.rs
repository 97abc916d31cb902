use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{dto::assignment_dto::CreateAssignmentPayload, error::Result, AppState};

#[axum::debug_handler]
pub async fn list_assignments(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let assignments = state.assignment_service.list().await?;
    Ok(Json(assignments))
}

#[axum::debug_handler]
pub async fn create_assignment(
    State(state): State<AppState>,
    Json(payload): Json<CreateAssignmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let assignment = state.assignment_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}
