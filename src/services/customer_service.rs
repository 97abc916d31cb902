use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::dto::customer_dto::CustomerPayload;
use crate::error::{Error, Result};
use crate::models::customer::Customer;
use crate::platform::store::RecordStore;

#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn RecordStore>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Customer>> {
        let rows = self.store.list("customers", "*").await?;
        let customers = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Customer>, _>>()?;
        Ok(customers)
    }

    pub async fn create(&self, payload: CustomerPayload) -> Result<Customer> {
        let row = self.store.insert("customers", to_row(&payload)?, "*").await?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn update(&self, id: Uuid, payload: CustomerPayload) -> Result<Customer> {
        let row = self
            .store
            .update_by_id("customers", id, to_row(&payload)?, "*")
            .await?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.store.delete_by_id("customers", id).await?;
        Ok(())
    }
}

fn to_row(payload: &CustomerPayload) -> Result<serde_json::Value> {
    let company_name = payload
        .company_name
        .as_deref()
        .ok_or_else(|| Error::BadRequest("Company name is required".to_string()))?;
    Ok(json!({
        "company_name": company_name,
        "industry": payload.industry,
        "website": payload.website,
        "address": payload.address,
    }))
}
