use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use uuid::Uuid;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Error reported by the store itself. `code` is the SQLSTATE-style code
    /// the error translator keys on (42501, 42703, 23505, ...).
    #[error("{message}")]
    Upstream {
        code: Option<String>,
        message: String,
    },

    #[error("unexpected store response: {0}")]
    Malformed(String),
}

/// Query surface over the hosted relational store. Rows travel as JSON; the
/// service layer owns the typed projections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Full table read with a column/embed selection, e.g.
    /// `"*, customers(company_name)"`.
    async fn list(&self, table: &str, select: &str) -> StoreResult<Vec<Value>>;

    /// Single row matched by an equality filter, or None.
    async fn find_by(
        &self,
        table: &str,
        select: &str,
        column: &str,
        value: &str,
    ) -> StoreResult<Option<Value>>;

    /// Inserts one row and returns it with the given selection applied.
    async fn insert(&self, table: &str, row: Value, select: &str) -> StoreResult<Value>;

    /// Full-document update by primary key, returning the updated row.
    async fn update_by_id(
        &self,
        table: &str,
        id: Uuid,
        patch: Value,
        select: &str,
    ) -> StoreResult<Value>;

    /// Hard delete by primary key.
    async fn delete_by_id(&self, table: &str, id: Uuid) -> StoreResult<()>;

    /// Exact row count, used by the health probe.
    async fn count(&self, table: &str) -> StoreResult<i64>;
}

/// HTTP client for the platform's REST data API (`/rest/v1/{table}`).
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl RestStore {
    pub fn new(client: Client, base_url: &str, service_key: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            service_key: service_key.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn check(response: reqwest::Response) -> StoreResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body: Value = response.json().await.unwrap_or_default();
        Err(parse_error_body(status, &body))
    }
}

/// The store reports errors as `{"code": "...", "message": "..."}`.
fn parse_error_body(status: reqwest::StatusCode, body: &Value) -> StoreError {
    let code = body
        .get("code")
        .and_then(Value::as_str)
        .map(|s| s.to_string());
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("store operation failed")
        .to_string();
    tracing::error!(%status, ?code, %message, "record store rejected request");
    StoreError::Upstream { code, message }
}

/// `Content-Range: 0-24/3519` → 3519. A HEAD count probe has no body, the
/// total rides in this header.
fn parse_content_range(raw: &str) -> Option<i64> {
    raw.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl RecordStore for RestStore {
    async fn list(&self, table: &str, select: &str) -> StoreResult<Vec<Value>> {
        let url = format!("{}/{}?select={}", self.base_url, table, select);
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn find_by(
        &self,
        table: &str,
        select: &str,
        column: &str,
        value: &str,
    ) -> StoreResult<Option<Value>> {
        let url = format!(
            "{}/{}?select={}&{}=eq.{}",
            self.base_url, table, select, column, value
        );
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let response = Self::check(response).await?;
        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    async fn insert(&self, table: &str, row: Value, select: &str) -> StoreResult<Value> {
        let url = format!("{}/{}?select={}", self.base_url, table, select);
        let response = self
            .request(reqwest::Method::POST, url)
            .header("Prefer", "return=representation")
            .json(&vec![row])
            .send()
            .await?;
        let response = Self::check(response).await?;
        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(StoreError::Malformed(format!(
                "insert into {} returned no rows",
                table
            )));
        }
        Ok(rows.remove(0))
    }

    async fn update_by_id(
        &self,
        table: &str,
        id: Uuid,
        patch: Value,
        select: &str,
    ) -> StoreResult<Value> {
        let url = format!(
            "{}/{}?id=eq.{}&select={}",
            self.base_url, table, id, select
        );
        let response = self
            .request(reqwest::Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(StoreError::Upstream {
                code: None,
                message: format!("no {} row with id {}", table, id),
            });
        }
        Ok(rows.remove(0))
    }

    async fn delete_by_id(&self, table: &str, id: Uuid) -> StoreResult<()> {
        let url = format!("{}/{}?id=eq.{}", self.base_url, table, id);
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn count(&self, table: &str) -> StoreResult<i64> {
        let url = format!("{}/{}?select=id", self.base_url, table);
        let response = self
            .request(reqwest::Method::HEAD, url)
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = Self::check(response).await?;
        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| StoreError::Malformed("missing content-range on count".to_string()))
    }
}
