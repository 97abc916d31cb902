use std::sync::Arc;

use serde_json::json;

use crate::dto::assignment_dto::CreateAssignmentPayload;
use crate::error::{Error, Result};
use crate::models::assignment::Assignment;
use crate::platform::store::RecordStore;

/// Assignments are read with the full deal and the assigning user's name
/// embedded. The foreign-key hint disambiguates the users relationship.
const ASSIGNMENT_SELECT: &str =
    "*,deal:deals(*),assigned_by:users!user_assignments_assigned_by_fkey(first_name,last_name)";

#[derive(Clone)]
pub struct AssignmentService {
    store: Arc<dyn RecordStore>,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Assignment>> {
        let rows = self.store.list("user_assignments", ASSIGNMENT_SELECT).await?;
        let assignments = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Assignment>, _>>()?;
        Ok(assignments)
    }

    pub async fn create(&self, payload: CreateAssignmentPayload) -> Result<Assignment> {
        let missing = || Error::BadRequest("Missing required assignment fields".to_string());
        let row = json!({
            "user_id": payload.user_id.ok_or_else(missing)?,
            "deal_id": payload.deal_id.ok_or_else(missing)?,
            "assigned_by": payload.assigned_by.ok_or_else(missing)?,
        });
        let inserted = self
            .store
            .insert("user_assignments", row, ASSIGNMENT_SELECT)
            .await?;
        Ok(serde_json::from_value(inserted)?)
    }
}
