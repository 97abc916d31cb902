use std::sync::Arc;

use serde_json::json;
use tracing::{error, warn};

use crate::dto::auth_dto::{
    LoginPayload, LoginResponse, RefreshPayload, RegisterPayload, RegisterResponse,
};
use crate::error::{Error, Result};
use crate::models::user::{
    ApplicationUser, Role, UserAccount, ACCOUNT_PROJECTION, USER_PROJECTION,
};
use crate::platform::identity::{IdentityError, IdentityProvider, Session};
use crate::platform::store::RecordStore;

/// How far a two-phase account creation got. `PartiallyFailed` means the
/// application row failed AND the compensating identity delete failed too,
/// leaving an orphaned identity upstream.
#[derive(Debug)]
pub enum ProvisionOutcome {
    Committed(UserAccount),
    RolledBack { cause: Error },
    PartiallyFailed { cause: Error },
}

/// Two-phase account provisioning: identity sign-up first, `users` row
/// second. There is no transaction across the two services; the compensating
/// delete is best-effort, not a guarantee.
#[derive(Clone)]
pub struct Provisioning {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn RecordStore>,
}

impl Provisioning {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn RecordStore>) -> Self {
        Self { identity, store }
    }

    pub async fn run(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        role: Role,
    ) -> Result<ProvisionOutcome> {
        // Phase 1: nothing to compensate if this fails.
        let identity = self
            .identity
            .sign_up(email, password)
            .await
            .map_err(sign_up_error)?;

        let row = json!({
            "id": identity.id,
            "email": email,
            "first_name": first_name,
            "last_name": last_name,
            "role": role,
            "is_active": true,
        });

        match self.store.insert("users", row, ACCOUNT_PROJECTION).await {
            Ok(row) => {
                let user: UserAccount = serde_json::from_value(row)?;
                Ok(ProvisionOutcome::Committed(user))
            }
            Err(store_err) => {
                error!(
                    error = %store_err,
                    identity = %identity.id,
                    "user row insert failed, compensating identity delete"
                );
                let cause = Error::Store(store_err);
                match self.identity.delete_identity(identity.id).await {
                    Ok(()) => Ok(ProvisionOutcome::RolledBack { cause }),
                    Err(delete_err) => {
                        // Logged and swallowed: the row-insert failure is what
                        // the caller must see, never this one.
                        error!(
                            error = %delete_err,
                            identity = %identity.id,
                            "compensating identity delete failed, identity orphaned"
                        );
                        Ok(ProvisionOutcome::PartiallyFailed { cause })
                    }
                }
            }
        }
    }
}

fn sign_up_error(err: IdentityError) -> Error {
    match err {
        IdentityError::Rejected(msg) => Error::BadRequest(msg),
        IdentityError::InvalidToken => Error::BadRequest("Failed to create user".to_string()),
        IdentityError::Transport(e) => Error::Reqwest(e),
        IdentityError::Malformed(msg) => Error::Internal(msg),
    }
}

fn credential_error(err: IdentityError) -> Error {
    match err {
        IdentityError::Rejected(msg) => Error::Unauthorized(msg),
        IdentityError::InvalidToken => {
            Error::Unauthorized("Invalid login credentials".to_string())
        }
        IdentityError::Transport(e) => Error::Reqwest(e),
        IdentityError::Malformed(msg) => Error::Internal(msg),
    }
}

#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn RecordStore>,
    provisioning: Provisioning,
}

impl AuthService {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn RecordStore>) -> Self {
        let provisioning = Provisioning::new(identity.clone(), store.clone());
        Self {
            identity,
            store,
            provisioning,
        }
    }

    pub async fn register(&self, payload: RegisterPayload) -> Result<RegisterResponse> {
        let RegisterPayload {
            email: Some(email),
            password: Some(password),
            first_name: Some(first_name),
            last_name: Some(last_name),
            role,
        } = payload
        else {
            return Err(Error::BadRequest("All fields are required".to_string()));
        };

        let role = role.unwrap_or_default();
        let outcome = self
            .provisioning
            .run(&email, &password, &first_name, &last_name, role)
            .await?;

        let user = match outcome {
            ProvisionOutcome::Committed(user) => user,
            ProvisionOutcome::RolledBack { cause }
            | ProvisionOutcome::PartiallyFailed { cause } => {
                error!(error = %cause, "account provisioning failed");
                return Err(Error::Internal("Error creating user record".to_string()));
            }
        };

        // Best-effort: the account exists either way, a failed auto sign-in
        // only downgrades the response.
        match self.identity.sign_in(&email, &password).await {
            Ok((_, session)) => Ok(RegisterResponse::SignedIn { user, session }),
            Err(err) => {
                warn!(error = %err, "auto sign-in after registration failed");
                Ok(RegisterResponse::NeedsSignIn {
                    message: "User created successfully. Please sign in.".to_string(),
                    user,
                })
            }
        }
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<LoginResponse> {
        let (Some(email), Some(password)) =
            (payload.email.as_deref(), payload.password.as_deref())
        else {
            return Err(Error::BadRequest(
                "Email and password are required".to_string(),
            ));
        };

        let (identity, session) = self
            .identity
            .sign_in(email, password)
            .await
            .map_err(credential_error)?;

        let row = self
            .store
            .find_by("users", USER_PROJECTION, "id", &identity.id.to_string())
            .await?;
        // Valid platform credential without a provisioned row is not enough:
        // application access requires the projection to exist.
        let Some(row) = row else {
            return Err(Error::NotFound("User not found".to_string()));
        };
        let user: ApplicationUser = serde_json::from_value(row)?;

        Ok(LoginResponse { user, session })
    }

    /// Revoking an already-dead session counts as success.
    pub async fn logout(&self, access_token: Option<&str>) -> Result<()> {
        if let Some(token) = access_token {
            self.identity.sign_out(token).await.map_err(|err| match err {
                IdentityError::Transport(e) => Error::Reqwest(e),
                other => Error::Internal(other.to_string()),
            })?;
        }
        Ok(())
    }

    pub async fn refresh(&self, payload: RefreshPayload) -> Result<Session> {
        let Some(token) = payload.refresh_token.as_deref() else {
            return Err(Error::BadRequest("Refresh token is required".to_string()));
        };

        self.identity
            .refresh(token)
            .await
            .map_err(|err| match err {
                IdentityError::Rejected(_) | IdentityError::InvalidToken => {
                    Error::Unauthorized("Invalid refresh token".to_string())
                }
                IdentityError::Transport(e) => Error::Reqwest(e),
                IdentityError::Malformed(msg) => Error::Internal(msg),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::identity::{Identity, MockIdentityProvider};
    use crate::platform::store::{MockRecordStore, StoreError};
    use uuid::Uuid;

    fn account_row(id: Uuid) -> serde_json::Value {
        json!({
            "id": id,
            "email": "new@example.com",
            "first_name": "New",
            "last_name": "User",
            "role": "agent",
            "is_active": true,
        })
    }

    fn identity_for(id: Uuid) -> Identity {
        Identity {
            id,
            email: "new@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn provisioning_commits_when_both_phases_succeed() {
        let id = Uuid::new_v4();
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_up()
            .returning(move |_, _| Ok(identity_for(id)));
        identity.expect_delete_identity().never();

        let mut store = MockRecordStore::new();
        store
            .expect_insert()
            .returning(move |_, _, _| Ok(account_row(id)));

        let saga = Provisioning::new(Arc::new(identity), Arc::new(store));
        let outcome = saga
            .run("new@example.com", "secret12", "New", "User", Role::Agent)
            .await
            .unwrap();

        match outcome {
            ProvisionOutcome::Committed(user) => {
                assert_eq!(user.id, id);
                assert_eq!(user.role, Role::Agent);
            }
            other => panic!("expected commit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_row_insert_rolls_back_the_identity() {
        let id = Uuid::new_v4();
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_up()
            .returning(move |_, _| Ok(identity_for(id)));
        identity
            .expect_delete_identity()
            .times(1)
            .withf(move |got| *got == id)
            .returning(|_| Ok(()));

        let mut store = MockRecordStore::new();
        store.expect_insert().returning(|_, _, _| {
            Err(StoreError::Upstream {
                code: Some("23505".to_string()),
                message: "duplicate key value".to_string(),
            })
        });

        let saga = Provisioning::new(Arc::new(identity), Arc::new(store));
        let outcome = saga
            .run("new@example.com", "secret12", "New", "User", Role::Agent)
            .await
            .unwrap();

        assert!(matches!(outcome, ProvisionOutcome::RolledBack { .. }));
    }

    #[tokio::test]
    async fn failed_compensation_is_recorded_not_masked() {
        let id = Uuid::new_v4();
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_up()
            .returning(move |_, _| Ok(identity_for(id)));
        identity
            .expect_delete_identity()
            .times(1)
            .returning(|_| Err(IdentityError::Rejected("admin API down".to_string())));

        let mut store = MockRecordStore::new();
        store.expect_insert().returning(|_, _, _| {
            Err(StoreError::Upstream {
                code: None,
                message: "insert blew up".to_string(),
            })
        });

        let saga = Provisioning::new(Arc::new(identity), Arc::new(store));
        let outcome = saga
            .run("new@example.com", "secret12", "New", "User", Role::Agent)
            .await
            .unwrap();

        // The original store failure is the recorded cause, not the failed
        // delete.
        match outcome {
            ProvisionOutcome::PartiallyFailed { cause } => {
                assert!(cause.to_string().contains("insert blew up"));
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn login_with_unprovisioned_identity_is_not_found() {
        let id = Uuid::new_v4();
        let mut identity = MockIdentityProvider::new();
        identity.expect_sign_in().returning(move |_, _| {
            Ok((
                identity_for(id),
                Session {
                    access_token: "at".to_string(),
                    refresh_token: "rt".to_string(),
                },
            ))
        });

        let mut store = MockRecordStore::new();
        store.expect_find_by().returning(|_, _, _, _| Ok(None));

        let service = AuthService::new(Arc::new(identity), Arc::new(store));
        let err = service
            .login(LoginPayload {
                email: Some("new@example.com".to_string()),
                password: Some("secret12".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
    }
}
