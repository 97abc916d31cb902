use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Column selection for the auth projection. Role lives only in this row,
/// never in the token, so every resolution re-reads it.
pub const USER_PROJECTION: &str = "id,email,first_name,last_name,role";

/// Projection used by the user-management endpoints.
pub const ACCOUNT_PROJECTION: &str = "id,email,first_name,last_name,role,is_active";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Agent,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Manager => write!(f, "manager"),
            Role::Agent => write!(f, "agent"),
        }
    }
}

/// Application-side projection of an identity: what the session resolver
/// attaches to a request and what `/auth/me` returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// Full user row as managed through the users endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
}
