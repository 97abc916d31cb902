#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use serde_json::{json, Value};
use uuid::Uuid;

use crm_backend::platform::identity::{
    Identity, IdentityError, IdentityProvider, IdentityResult, Session,
};
use crm_backend::platform::store::{RecordStore, StoreError, StoreResult};
use crm_backend::AppState;

struct Account {
    id: Uuid,
    email: String,
    password: String,
}

/// In-process stand-in for the hosted identity service. Tokens are opaque
/// strings tracked in maps; flags let tests force specific failure modes.
#[derive(Default)]
pub struct FakeIdentity {
    accounts: Mutex<HashMap<String, Account>>,
    sessions: Mutex<HashMap<String, Uuid>>,
    refresh_tokens: Mutex<HashMap<String, Uuid>>,
    pub fail_delete: AtomicBool,
    pub fail_refresh: AtomicBool,
    pub fail_sign_in: AtomicBool,
    /// Refresh succeeds but mints tokens the service will not recognize,
    /// so the retried request 401s again.
    pub mint_dead_sessions: AtomicBool,
    pub refresh_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&self, id: Uuid) -> Session {
        let session = Session {
            access_token: format!("at-{}", Uuid::new_v4()),
            refresh_token: format!("rt-{}", Uuid::new_v4()),
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(session.access_token.clone(), id);
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(session.refresh_token.clone(), id);
        session
    }

    /// Server-side revocation, for forcing a 401 mid-test.
    pub fn revoke_access(&self, token: &str) {
        self.sessions.lock().unwrap().remove(token);
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.accounts.lock().unwrap().contains_key(email)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> IdentityResult<Identity> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(IdentityError::Rejected("User already registered".to_string()));
        }
        let id = Uuid::new_v4();
        accounts.insert(
            email.to_string(),
            Account {
                id,
                email: email.to_string(),
                password: password.to_string(),
            },
        );
        Ok(Identity {
            id,
            email: email.to_string(),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<(Identity, Session)> {
        if self.fail_sign_in.load(Ordering::SeqCst) {
            return Err(IdentityError::Rejected("sign-in disabled".to_string()));
        }
        let (id, email) = {
            let accounts = self.accounts.lock().unwrap();
            let Some(account) = accounts.get(email) else {
                return Err(IdentityError::Rejected(
                    "Invalid login credentials".to_string(),
                ));
            };
            if account.password != password {
                return Err(IdentityError::Rejected(
                    "Invalid login credentials".to_string(),
                ));
            }
            (account.id, account.email.clone())
        };
        Ok((Identity { id, email }, self.mint(id)))
    }

    async fn sign_out(&self, access_token: &str) -> IdentityResult<()> {
        // Revoking an unknown token is still success.
        self.sessions.lock().unwrap().remove(access_token);
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> IdentityResult<Identity> {
        let id = {
            let sessions = self.sessions.lock().unwrap();
            match sessions.get(access_token) {
                Some(id) => *id,
                None => return Err(IdentityError::InvalidToken),
            }
        };
        let accounts = self.accounts.lock().unwrap();
        let account = accounts
            .values()
            .find(|a| a.id == id)
            .ok_or(IdentityError::InvalidToken)?;
        Ok(Identity {
            id: account.id,
            email: account.email.clone(),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> IdentityResult<Session> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(IdentityError::InvalidToken);
        }
        let id = {
            let tokens = self.refresh_tokens.lock().unwrap();
            match tokens.get(refresh_token) {
                Some(id) => *id,
                None => return Err(IdentityError::InvalidToken),
            }
        };
        if self.mint_dead_sessions.load(Ordering::SeqCst) {
            return Ok(Session {
                access_token: format!("dead-{}", Uuid::new_v4()),
                refresh_token: format!("rt-{}", Uuid::new_v4()),
            });
        }
        Ok(self.mint(id))
    }

    async fn delete_identity(&self, id: Uuid) -> IdentityResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(IdentityError::Rejected("admin delete unavailable".to_string()));
        }
        self.accounts.lock().unwrap().retain(|_, a| a.id != id);
        Ok(())
    }
}

/// In-process record store with just enough select/embed handling for the
/// projections the services use.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    fail_inserts: Mutex<HashSet<String>>,
    fail_lists: Mutex<HashSet<String>>,
    pub calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_inserts_into(&self, table: &str) {
        self.fail_inserts.lock().unwrap().insert(table.to_string());
    }

    pub fn fail_lists_of(&self, table: &str) {
        self.fail_lists.lock().unwrap().insert(table.to_string());
    }

    pub fn seed(&self, table: &str, row: Value) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn reject(message: &str) -> StoreError {
        StoreError::Upstream {
            code: None,
            message: message.to_string(),
        }
    }
}

/// Splits a selection on commas outside embed parentheses.
fn split_select(select: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in select.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(select[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(select[start..].trim());
    parts
}

/// Applies a projection with embeds (`alias:table!fk(cols)`) the way the
/// real store would: the embed joins through `{alias}` when the row carries
/// the key under that name, otherwise through `{singular}_id`.
fn project(tables: &HashMap<String, Vec<Value>>, row: &Value, select: &str) -> Value {
    let mut out = serde_json::Map::new();
    for part in split_select(select) {
        if part == "*" {
            if let Some(obj) = row.as_object() {
                for (k, v) in obj {
                    out.insert(k.clone(), v.clone());
                }
            }
        } else if let Some(open) = part.find('(') {
            let head = &part[..open];
            let cols = &part[open + 1..part.len() - 1];
            let (alias, target) = match head.split_once(':') {
                Some((a, t)) => (a, t),
                None => (head, head),
            };
            let target_table = target.split('!').next().unwrap_or(target);

            let join_key = row
                .get(alias)
                .and_then(Value::as_str)
                .map(|s| s.to_string())
                .or_else(|| {
                    let fk = format!("{}_id", target_table.trim_end_matches('s'));
                    row.get(&fk).and_then(Value::as_str).map(|s| s.to_string())
                });

            let embedded = join_key
                .and_then(|id| {
                    tables.get(target_table).and_then(|rows| {
                        rows.iter()
                            .find(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str()))
                            .cloned()
                    })
                })
                .map(|target_row| {
                    if cols.trim() == "*" {
                        target_row
                    } else {
                        let mut picked = serde_json::Map::new();
                        for col in cols.split(',') {
                            let col = col.trim();
                            if let Some(v) = target_row.get(col) {
                                picked.insert(col.to_string(), v.clone());
                            }
                        }
                        Value::Object(picked)
                    }
                });
            out.insert(alias.to_string(), embedded.unwrap_or(Value::Null));
        } else if let Some(v) = row.get(part) {
            out.insert(part.to_string(), v.clone());
        }
    }
    Value::Object(out)
}

fn matches_column(row: &Value, column: &str, value: &str) -> bool {
    match row.get(column) {
        Some(Value::String(s)) => s == value,
        Some(other) => other.to_string() == value,
        None => false,
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list(&self, table: &str, select: &str) -> StoreResult<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.lock().unwrap().contains(table) {
            return Err(Self::reject("list rejected"));
        }
        let tables = self.tables.lock().unwrap();
        let rows = tables.get(table).cloned().unwrap_or_default();
        Ok(rows.iter().map(|r| project(&tables, r, select)).collect())
    }

    async fn find_by(
        &self,
        table: &str,
        select: &str,
        column: &str,
        value: &str,
    ) -> StoreResult<Option<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().unwrap();
        let found = tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| matches_column(r, column, value)))
            .map(|r| project(&tables, r, select));
        Ok(found)
    }

    async fn insert(&self, table: &str, row: Value, select: &str) -> StoreResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.lock().unwrap().contains(table) {
            return Err(Self::reject("insert rejected"));
        }
        let mut row = row;
        if row.get("id").is_none() {
            row.as_object_mut()
                .expect("insert rows are objects")
                .insert("id".to_string(), json!(Uuid::new_v4()));
        }
        let mut tables = self.tables.lock().unwrap();
        tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(project(&tables, &row, select))
    }

    async fn update_by_id(
        &self,
        table: &str,
        id: Uuid,
        patch: Value,
        select: &str,
    ) -> StoreResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let id_str = id.to_string();
        let updated = {
            let rows = tables
                .get_mut(table)
                .ok_or_else(|| Self::reject("no such table"))?;
            let row = rows
                .iter_mut()
                .find(|r| matches_column(r, "id", &id_str))
                .ok_or_else(|| Self::reject("no row for id"))?;
            if let (Some(target), Some(changes)) = (row.as_object_mut(), patch.as_object()) {
                for (k, v) in changes {
                    target.insert(k.clone(), v.clone());
                }
            }
            row.clone()
        };
        Ok(project(&tables, &updated, select))
    }

    async fn delete_by_id(&self, table: &str, id: Uuid) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let id_str = id.to_string();
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|r| !matches_column(r, "id", &id_str));
        }
        Ok(())
    }

    async fn count(&self, table: &str) -> StoreResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.lock().unwrap().contains(table) {
            return Err(Self::reject("count rejected"));
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables.get(table).map(|r| r.len()).unwrap_or(0) as i64)
    }
}

pub struct TestHarness {
    pub identity: Arc<FakeIdentity>,
    pub store: Arc<InMemoryStore>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            identity: Arc::new(FakeIdentity::new()),
            store: Arc::new(InMemoryStore::new()),
        }
    }

    pub fn router(&self) -> Router {
        crm_backend::app(AppState::new(self.identity.clone(), self.store.clone()))
    }

    /// Creates an identity plus its `users` row and hands back a live session.
    pub async fn provision_user(&self, email: &str, role: &str) -> (Uuid, Session) {
        let identity = self
            .identity
            .sign_up(email, "password123")
            .await
            .expect("sign up");
        self.store.seed(
            "users",
            json!({
                "id": identity.id,
                "email": email,
                "first_name": "Test",
                "last_name": "User",
                "role": role,
                "is_active": true,
            }),
        );
        let (_, session) = self
            .identity
            .sign_in(email, "password123")
            .await
            .expect("sign in");
        (identity.id, session)
    }

    pub fn seed_customer(&self, company_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.store.seed(
            "customers",
            json!({
                "id": id,
                "company_name": company_name,
                "industry": "Software",
                "website": null,
                "address": null,
            }),
        );
        id
    }
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    }
}
