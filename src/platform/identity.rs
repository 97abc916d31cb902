use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

/// The slice of the hosted identity record this application consumes.
/// Credentials, confirmation state and everything else stay upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// Bearer token pair issued by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

pub type IdentityResult<T> = std::result::Result<T, IdentityError>;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The platform refused the operation (bad credential, email taken, ...).
    /// Carries the upstream message, which is safe to echo for auth endpoints.
    #[error("{0}")]
    Rejected(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("identity request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected identity response: {0}")]
    Malformed(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates a credentialed identity. Email confirmation is disabled, so
    /// the identity is immediately able to sign in.
    async fn sign_up(&self, email: &str, password: &str) -> IdentityResult<Identity>;

    /// Exchanges a password credential for a session.
    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<(Identity, Session)>;

    /// Invalidates a session. Revoking an already-dead session is a success.
    async fn sign_out(&self, access_token: &str) -> IdentityResult<()>;

    /// Resolves a bearer token to the identity it was issued for.
    async fn get_user(&self, access_token: &str) -> IdentityResult<Identity>;

    /// Exchanges a refresh token for a fresh session pair.
    async fn refresh(&self, refresh_token: &str) -> IdentityResult<Session>;

    /// Admin-deletes an identity. Used as the compensating step when
    /// provisioning fails halfway.
    async fn delete_identity(&self, id: Uuid) -> IdentityResult<()>;
}

/// HTTP client for the platform's identity API (`/auth/v1/*`).
#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl IdentityClient {
    pub fn new(client: Client, base_url: &str, anon_key: &str, service_key: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/auth/v1", base_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn parse_identity(body: &Value) -> IdentityResult<Identity> {
        // Depending on the endpoint the identity arrives at the root or under
        // a "user" key.
        let user = body.get("user").unwrap_or(body);
        serde_json::from_value(user.clone())
            .map_err(|e| IdentityError::Malformed(format!("identity payload: {}", e)))
    }

    fn parse_session(body: &Value) -> IdentityResult<Session> {
        serde_json::from_value(body.clone())
            .map_err(|e| IdentityError::Malformed(format!("session payload: {}", e)))
    }

    async fn rejection(response: reqwest::Response) -> IdentityError {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or_default();
        let message = body
            .get("msg")
            .or_else(|| body.get("error_description"))
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("identity operation rejected")
            .to_string();
        warn!(%status, %message, "identity service rejected request");
        if status == StatusCode::UNAUTHORIZED {
            IdentityError::InvalidToken
        } else {
            IdentityError::Rejected(message)
        }
    }
}

#[async_trait]
impl IdentityProvider for IdentityClient {
    async fn sign_up(&self, email: &str, password: &str) -> IdentityResult<Identity> {
        let response = self
            .client
            .post(format!("{}/signup", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let body: Value = response.json().await?;
        Self::parse_identity(&body)
    }

    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<(Identity, Session)> {
        let response = self
            .client
            .post(format!("{}/token?grant_type=password", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let body: Value = response.json().await?;
        Ok((Self::parse_identity(&body)?, Self::parse_session(&body)?))
    }

    async fn sign_out(&self, access_token: &str) -> IdentityResult<()> {
        let response = self
            .client
            .post(format!("{}/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        // A token that is already dead cannot be revoked twice; callers treat
        // that the same as a successful sign-out.
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(Self::rejection(response).await),
        }
    }

    async fn get_user(&self, access_token: &str) -> IdentityResult<Identity> {
        let response = self
            .client
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let body: Value = response.json().await?;
        Self::parse_identity(&body)
    }

    async fn refresh(&self, refresh_token: &str) -> IdentityResult<Session> {
        let response = self
            .client
            .post(format!("{}/token?grant_type=refresh_token", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let body: Value = response.json().await?;
        Self::parse_session(&body)
    }

    async fn delete_identity(&self, id: Uuid) -> IdentityResult<()> {
        let response = self
            .client
            .delete(format!("{}/admin/users/{}", self.base_url, id))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        Ok(())
    }
}
