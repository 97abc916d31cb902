use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::deal::Deal;

/// Assigning-user slice embedded into joined assignment reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignerRef {
    pub first_name: String,
    pub last_name: String,
}

/// A deal handed to an agent. On joined reads the `assigned_by` foreign key
/// is replaced by the assigning user's name and `deal` carries the full row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub deal_id: Uuid,
    pub assigned_by: Option<AssignerRef>,
    pub deal: Option<Deal>,
    pub created_at: Option<DateTime<Utc>>,
}
