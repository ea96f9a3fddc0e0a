//! Dedup marker (§3, §4.5 C5) — one row per trigger occurrence ever queued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marks a single trigger occurrence as already queued for a workflow.
///
/// `(workflow_id, trigger_type, external_id)` is unique at the storage
/// layer (§8 I3) — attempting to insert a duplicate is how the dedup
/// store recognizes a trigger it has already dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedTrigger {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub trigger_type: String,
    pub external_id: String,
    /// Opaque; nothing in this engine currently populates it beyond `null`.
    pub metadata: serde_json::Value,
    pub processed_at: DateTime<Utc>,
}

impl ProcessedTrigger {
    pub fn new(
        workflow_id: Uuid,
        trigger_type: impl Into<String>,
        external_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            trigger_type: trigger_type.into(),
            external_id: external_id.into(),
            metadata: serde_json::Value::Null,
            processed_at: Utc::now(),
        }
    }
}
