use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAssignmentPayload {
    #[validate(required)]
    pub user_id: Option<Uuid>,
    #[validate(required)]
    pub deal_id: Option<Uuid>,
    #[validate(required)]
    pub assigned_by: Option<Uuid>,
}
