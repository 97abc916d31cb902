//! HTTP client for the gateway: holds the session, stamps bearer tokens onto
//! outgoing requests, and recovers from a single 401 with one refresh-and-
//! retry. Refresh-token exchange goes through the identity provider, the same
//! seam the server uses.

pub mod session;

pub use session::{AuthState, SessionHandle};

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::warn;

use crate::dto::auth_dto::{LoginResponse, RegisterPayload, RegisterResponse};
use crate::models::assignment::Assignment;
use crate::models::contact::Contact;
use crate::models::customer::Customer;
use crate::models::deal::Deal;
use crate::models::user::{ApplicationUser, Role};
use crate::platform::identity::IdentityProvider;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("session expired")]
    SessionExpired,
}

/// What the UI shows for a failed fetch: a title, a short human message, and
/// the technical detail tucked behind a disclosure.
#[derive(Debug, Clone)]
pub struct ErrorNotice {
    pub title: String,
    pub message: String,
    pub detail: Option<String>,
}

impl ClientError {
    pub fn notice(&self) -> ErrorNotice {
        match self {
            ClientError::SessionExpired => ErrorNotice {
                title: "Session expired".to_string(),
                message: "Please sign in again.".to_string(),
                detail: None,
            },
            ClientError::Api { status, message } => ErrorNotice {
                title: "Request failed".to_string(),
                message: message.clone(),
                detail: Some(format!("HTTP {}", status)),
            },
            ClientError::Transport(err) => ErrorNotice {
                title: "Connection problem".to_string(),
                message: "Could not reach the server.".to_string(),
                detail: Some(err.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub customers: usize,
    pub contacts: usize,
    pub deals: usize,
}

#[derive(Debug, Clone)]
pub struct AssignmentBoard {
    pub agents: Vec<ApplicationUser>,
    pub deals: Vec<Deal>,
    pub assignments: Vec<Assignment>,
}

#[derive(Clone)]
pub struct CrmClient {
    http: reqwest::Client,
    base_url: String,
    identity: Arc<dyn IdentityProvider>,
    session: SessionHandle,
    auth_tx: watch::Sender<AuthState>,
}

impl CrmClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let (auth_tx, _) = watch::channel(AuthState::default());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            identity,
            session: SessionHandle::default(),
            auth_tx,
        }
    }

    /// Auth-state stream. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.auth_tx.subscribe()
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    fn publish(&self, user: Option<ApplicationUser>) {
        self.auth_tx.send_replace(AuthState { user });
    }

    /// Startup session check. Run once before rendering, so a held session
    /// paints as authenticated instead of flashing signed-out first.
    pub async fn bootstrap(&self) {
        if self.session.current().await.is_none() {
            self.publish(None);
            return;
        }
        match self.me().await {
            Ok(user) => self.publish(Some(user)),
            Err(err) => {
                warn!(error = %err, "session check failed on startup");
                self.session.clear().await;
                self.publish(None);
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<ApplicationUser> {
        let response = self
            .http
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let login: LoginResponse = Self::decode(response).await?;
        self.session.replace(login.session).await;

        // The session store always re-fetches the projection rather than
        // trusting whatever the sign-in response carried.
        match self.me().await {
            Ok(user) => {
                self.publish(Some(user.clone()));
                Ok(user)
            }
            Err(err) => {
                self.session.clear().await;
                self.publish(None);
                Err(err)
            }
        }
    }

    pub async fn register(&self, payload: &RegisterPayload) -> ClientResult<RegisterResponse> {
        let response = self
            .http
            .post(format!("{}/api/auth/register", self.base_url))
            .json(payload)
            .send()
            .await?;
        let outcome: RegisterResponse = Self::decode(response).await?;
        if let RegisterResponse::SignedIn { session, .. } = &outcome {
            self.session.replace(session.clone()).await;
            if let Ok(user) = self.me().await {
                self.publish(Some(user));
            }
        }
        Ok(outcome)
    }

    pub async fn logout(&self) -> ClientResult<()> {
        let result = self.send(Method::POST, "/api/auth/logout", None).await;
        if let Err(err) = result {
            warn!(error = %err, "logout request failed, clearing session anyway");
        }
        self.session.clear().await;
        self.publish(None);
        Ok(())
    }

    pub async fn me(&self) -> ClientResult<ApplicationUser> {
        self.get_json("/api/auth/me").await
    }

    /// Core pipeline: attach the current token if one is held (a missing
    /// session never blocks the request), and on a 401 do exactly one
    /// refresh-and-retry. A second 401 on the retried request is surfaced
    /// as-is; there is no retry loop.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ClientResult<reqwest::Response> {
        let token = self.session.current().await.map(|s| s.access_token);
        let response = self.dispatch(&method, path, body, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(session) = self.session.current().await else {
            // Nothing to refresh with; the 401 stands.
            return Ok(response);
        };

        let refreshed = match self.identity.refresh(&session.refresh_token).await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "session refresh failed");
                self.session.clear().await;
                self.publish(None);
                return Err(ClientError::SessionExpired);
            }
        };
        self.session.replace(refreshed.clone()).await;

        let retried = self
            .dispatch(&method, path, body, Some(&refreshed.access_token))
            .await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            // Even the refreshed token was rejected; the session is dead.
            self.session.clear().await;
            self.publish(None);
        }
        Ok(retried)
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> reqwest::Result<reqwest::Response> {
        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send(Method::GET, path, None).await?;
        Self::decode(response).await
    }

    pub async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> ClientResult<T> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body: Value = response.json().await.unwrap_or_default();
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        Err(ClientError::Api { status, message })
    }

    /// Dashboard reads are independent: each failed fetch degrades its card
    /// to an empty count instead of failing the page.
    pub async fn dashboard_counts(&self) -> DashboardCounts {
        let (customers, contacts, deals) = tokio::join!(
            self.get_json::<Vec<Customer>>("/api/customers"),
            self.get_json::<Vec<Contact>>("/api/contacts"),
            self.get_json::<Vec<Deal>>("/api/deals"),
        );
        DashboardCounts {
            customers: count_or_empty("customers", customers),
            contacts: count_or_empty("contacts", contacts),
            deals: count_or_empty("deals", deals),
        }
    }

    /// The assignment page is unusable with partial data, so any failed
    /// prefetch aborts the lot.
    pub async fn assignment_board(&self) -> ClientResult<AssignmentBoard> {
        let (users, deals, assignments) = tokio::try_join!(
            self.get_json::<Vec<ApplicationUser>>("/api/users"),
            self.get_json::<Vec<Deal>>("/api/deals"),
            self.get_json::<Vec<Assignment>>("/api/assignments"),
        )?;
        Ok(AssignmentBoard {
            agents: users
                .into_iter()
                .filter(|u| u.role == Role::Agent)
                .collect(),
            deals,
            assignments,
        })
    }
}

fn count_or_empty<T>(what: &str, result: ClientResult<Vec<T>>) -> usize {
    match result {
        Ok(rows) => rows.len(),
        Err(err) => {
            warn!(error = %err, what, "dashboard fetch degraded to empty");
            0
        }
    }
}
