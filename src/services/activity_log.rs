use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::platform::store::RecordStore;

/// Appends an entry to `activity_logs`. Auditing must never fail the
/// operation it describes, so failures are logged and swallowed.
pub async fn record_activity(store: &dyn RecordStore, user_id: Uuid, action: &str) {
    let row = json!({ "user_id": user_id, "action": action });
    if let Err(err) = store.insert("activity_logs", row, "id").await {
        warn!(error = %err, %user_id, action, "failed to record activity");
    }
}
