use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::dto::deal_dto::CreateDealPayload;
use crate::error::{Error, Result};
use crate::models::deal::Deal;
use crate::platform::store::RecordStore;
use crate::services::activity_log::record_activity;

/// Deals are always read joined with the owning customer's company name.
const DEAL_SELECT: &str = "*,customers(company_name)";

#[derive(Clone)]
pub struct DealService {
    store: Arc<dyn RecordStore>,
}

impl DealService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Deal>> {
        let rows = self.store.list("deals", DEAL_SELECT).await?;
        let deals = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Deal>, _>>()?;
        Ok(deals)
    }

    /// `created_by` comes from the resolved caller, never from the body.
    pub async fn create(&self, payload: CreateDealPayload, created_by: Uuid) -> Result<Deal> {
        let (Some(title), Some(customer_id)) = (payload.title.clone(), payload.customer_id)
        else {
            return Err(Error::BadRequest(
                "Title and customer are required fields".to_string(),
            ));
        };

        // Referential check before the insert: a dangling customer_id is a
        // caller mistake, not a store failure.
        let customer = self
            .store
            .find_by("customers", "id", "id", &customer_id.to_string())
            .await?;
        if customer.is_none() {
            return Err(Error::BadRequest("Invalid customer selected".to_string()));
        }

        let row = json!({
            "title": title,
            "value": payload.value.unwrap_or(0.0),
            "status": payload.status.unwrap_or_default(),
            "customer_id": customer_id,
            "expected_close_date": payload.expected_close_date,
            "created_by": created_by,
            "created_at": Utc::now(),
        });
        let inserted = self.store.insert("deals", row, DEAL_SELECT).await?;
        let deal: Deal = serde_json::from_value(inserted)?;

        record_activity(self.store.as_ref(), created_by, "deal_created").await;

        Ok(deal)
    }
}
