use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::warn;

use crate::models::user::{ApplicationUser, USER_PROJECTION};
use crate::AppState;

/// Resolved caller identity, attached as a request extension for the rest of
/// the request's handling. Dropped with the request; nothing is cached across
/// requests, so the role read is paid on every call.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub ApplicationUser);

/// Why a bearer token failed to resolve to an application user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No Authorization header, wrong scheme, or an empty token.
    MissingCredential,
    /// The identity service would not vouch for the token.
    InvalidOrExpiredToken,
    /// The token is genuine but no application user row exists for it.
    UserNotProvisioned,
}

impl AuthError {
    fn message(self) -> &'static str {
        match self {
            AuthError::MissingCredential => "Missing or invalid authorization header",
            AuthError::InvalidOrExpiredToken => "Invalid or expired token",
            AuthError::UserNotProvisioned => "User not found in database",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": self.message() })),
        )
            .into_response()
    }
}

/// Session resolver: bearer token -> identity -> application user row.
/// Runs before every protected handler, so no store table is touched for a
/// request that cannot be resolved.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(req.headers()) {
        Some(token) => token,
        None => return AuthError::MissingCredential.into_response(),
    };

    let identity = match state.identity.get_user(&token).await {
        Ok(identity) => identity,
        Err(err) => {
            warn!(error = %err, "bearer token rejected by identity service");
            return AuthError::InvalidOrExpiredToken.into_response();
        }
    };

    // The role is authoritative here, not in the token, hence the per-request
    // read. Lookup is keyed by identity id on every path.
    let row = match state
        .store
        .find_by("users", USER_PROJECTION, "id", &identity.id.to_string())
        .await
    {
        Ok(Some(row)) => row,
        Ok(None) => return AuthError::UserNotProvisioned.into_response(),
        Err(err) => {
            warn!(error = %err, identity = %identity.id, "user lookup failed during resolution");
            return AuthError::UserNotProvisioned.into_response();
        }
    };

    let user: ApplicationUser = match serde_json::from_value(row) {
        Ok(user) => user,
        Err(err) => {
            warn!(error = %err, "malformed user row during resolution");
            return AuthError::UserNotProvisioned.into_response();
        }
    };

    req.extensions_mut().insert(CurrentUser(user));
    next.run(req).await
}

pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<String> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let value = header.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
