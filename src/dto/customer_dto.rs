use serde::{Deserialize, Serialize};
use validator::Validate;

/// Used for both create and full-document update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CustomerPayload {
    #[validate(required, length(min = 1, message = "Company name is required"))]
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
}
