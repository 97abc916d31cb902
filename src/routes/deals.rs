use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::deal_dto::CreateDealPayload,
    error::Result,
    middleware::auth::CurrentUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/deals",
    responses(
        (status = 200, description = "Deals joined with the customer company name"),
        (status = 401, description = "Unresolved session")
    )
)]
#[axum::debug_handler]
pub async fn list_deals(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let deals = state.deal_service.list().await?;
    Ok(Json(deals))
}

#[utoipa::path(
    post,
    path = "/api/deals",
    responses(
        (status = 201, description = "Deal created"),
        (status = 400, description = "Missing fields or unknown customer"),
        (status = 401, description = "Unresolved session")
    )
)]
#[axum::debug_handler]
pub async fn create_deal(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateDealPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let deal = state.deal_service.create(payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(deal)))
}
