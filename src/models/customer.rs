use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub company_name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Company slice embedded into joined reads (deals list/create).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRef {
    pub company_name: String,
}
