use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::customer::CompanyRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStatus {
    #[default]
    Lead,
    Opportunity,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub value: f64,
    pub status: DealStatus,
    pub customer_id: Uuid,
    pub expected_close_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    /// Present on joined reads (`customers(company_name)`).
    pub customers: Option<CompanyRef>,
}
