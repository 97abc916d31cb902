use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::dto::contact_dto::ContactPayload;
use crate::error::{Error, Result};
use crate::models::contact::Contact;
use crate::platform::store::RecordStore;

#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn RecordStore>,
}

impl ContactService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Contact>> {
        let rows = self.store.list("contacts", "*").await?;
        let contacts = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Contact>, _>>()?;
        Ok(contacts)
    }

    pub async fn create(&self, payload: ContactPayload) -> Result<Contact> {
        let row = self.store.insert("contacts", to_row(&payload)?, "*").await?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn update(&self, id: Uuid, payload: ContactPayload) -> Result<Contact> {
        let row = self
            .store
            .update_by_id("contacts", id, to_row(&payload)?, "*")
            .await?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.store.delete_by_id("contacts", id).await?;
        Ok(())
    }
}

fn to_row(payload: &ContactPayload) -> Result<serde_json::Value> {
    let missing = || Error::BadRequest("Missing required contact fields".to_string());
    Ok(json!({
        "first_name": payload.first_name.as_deref().ok_or_else(missing)?,
        "last_name": payload.last_name.as_deref().ok_or_else(missing)?,
        "email": payload.email.as_deref().ok_or_else(missing)?,
        "phone": payload.phone,
        "position": payload.position,
        "customer_id": payload.customer_id.ok_or_else(missing)?,
    }))
}
