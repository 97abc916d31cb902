use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::deal::DealStatus;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDealPayload {
    #[validate(
        required(message = "Title and customer are required fields"),
        length(min = 1, message = "Title and customer are required fields")
    )]
    pub title: Option<String>,
    pub value: Option<f64>,
    pub status: Option<DealStatus>,
    #[validate(required(message = "Title and customer are required fields"))]
    pub customer_id: Option<Uuid>,
    pub expected_close_date: Option<NaiveDate>,
}
