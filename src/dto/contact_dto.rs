use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Used for both create and full-document update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContactPayload {
    #[validate(required, length(min = 1))]
    pub first_name: Option<String>,
    #[validate(required, length(min = 1))]
    pub last_name: Option<String>,
    #[validate(required, email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    #[validate(required)]
    pub customer_id: Option<Uuid>,
}
