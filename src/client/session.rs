use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::user::ApplicationUser;
use crate::platform::identity::Session;

/// Shared handle to the credential in use. Passed explicitly into the request
/// layer; there is no process-global header state.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    pub async fn current(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    pub async fn replace(&self, session: Session) {
        *self.inner.write().await = Some(session);
    }

    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

/// What the UI binds to. Published through a watch channel, so a subscriber
/// sees the current state immediately on subscribe and every change after.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub user: Option<ApplicationUser>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
