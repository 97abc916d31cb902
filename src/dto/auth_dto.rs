use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{ApplicationUser, Role, UserAccount};
use crate::platform::identity::Session;

/// Registration takes its profile fields in camelCase, matching the sign-up
/// form wire shape. Everything else on the API is snake_case. Required fields
/// are `Option` so a missing key comes back as 400 with the form's message
/// rather than a 422 from the body extractor.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(required(message = "All fields are required"), email)]
    pub email: Option<String>,
    #[validate(
        required(message = "All fields are required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: Option<String>,
    #[serde(rename = "firstName")]
    #[validate(
        required(message = "All fields are required"),
        length(min = 1, message = "All fields are required")
    )]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    #[validate(
        required(message = "All fields are required"),
        length(min = 1, message = "All fields are required")
    )]
    pub last_name: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(required(message = "Email and password are required"))]
    pub email: Option<String>,
    #[validate(
        required(message = "Email and password are required"),
        length(min = 1, message = "Email and password are required")
    )]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshPayload {
    #[validate(
        required(message = "Refresh token is required"),
        length(min = 1, message = "Refresh token is required")
    )]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: ApplicationUser,
    pub session: Session,
}

/// Registration either hands back a usable session, or the account exists
/// but the caller has to sign in manually (auto sign-in failed).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegisterResponse {
    SignedIn { user: UserAccount, session: Session },
    NeedsSignIn { message: String, user: UserAccount },
}
