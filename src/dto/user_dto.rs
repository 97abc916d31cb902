use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::Role;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateUserPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    pub role: Role,
}
