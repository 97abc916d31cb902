use std::sync::Arc;

use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::dto::user_dto::{CreateUserPayload, UpdateUserPayload};
use crate::error::{Error, Result};
use crate::models::user::{ApplicationUser, UserAccount, ACCOUNT_PROJECTION};
use crate::platform::identity::IdentityProvider;
use crate::platform::store::RecordStore;
use crate::services::auth_service::{ProvisionOutcome, Provisioning};

/// Listing exposes the same projection the directory pages render.
const LIST_PROJECTION: &str = "id,first_name,last_name,email,role";

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn RecordStore>,
    provisioning: Provisioning,
}

impl UserService {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn RecordStore>) -> Self {
        let provisioning = Provisioning::new(identity, store.clone());
        Self {
            store,
            provisioning,
        }
    }

    pub async fn list(&self) -> Result<Vec<ApplicationUser>> {
        let rows = self.store.list("users", LIST_PROJECTION).await?;
        let users = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<ApplicationUser>, _>>()?;
        Ok(users)
    }

    /// Admin-driven account creation: same two-phase provisioning as
    /// self-registration, with an explicit role and no auto sign-in.
    pub async fn create(&self, payload: CreateUserPayload) -> Result<UserAccount> {
        let outcome = self
            .provisioning
            .run(
                &payload.email,
                &payload.password,
                &payload.first_name,
                &payload.last_name,
                payload.role,
            )
            .await?;

        match outcome {
            ProvisionOutcome::Committed(user) => Ok(user),
            ProvisionOutcome::RolledBack { cause } | ProvisionOutcome::PartiallyFailed { cause } => {
                error!(error = %cause, "admin account provisioning failed");
                Err(Error::Internal("Error creating user record".to_string()))
            }
        }
    }

    pub async fn update(&self, id: Uuid, payload: UpdateUserPayload) -> Result<UserAccount> {
        let patch = json!({
            "email": payload.email,
            "first_name": payload.first_name,
            "last_name": payload.last_name,
            "role": payload.role,
        });
        let row = self
            .store
            .update_by_id("users", id, patch, ACCOUNT_PROJECTION)
            .await?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<UserAccount> {
        let row = self
            .store
            .find_by("users", ACCOUNT_PROJECTION, "id", &id.to_string())
            .await?;
        let Some(row) = row else {
            return Err(Error::NotFound("User not found".to_string()));
        };
        let current: UserAccount = serde_json::from_value(row)?;

        let updated = self
            .store
            .update_by_id(
                "users",
                id,
                json!({ "is_active": !current.is_active }),
                ACCOUNT_PROJECTION,
            )
            .await?;
        Ok(serde_json::from_value(updated)?)
    }
}
