//! Append-only execution log (§3, §4.10 C10).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of events the engine ever records. New variants are the
/// only allowed extension point — nothing freeform (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    WorkflowCreated,
    WorkflowActivated,
    WorkflowDeactivated,
    WorkflowExecutionStarted,
    WorkflowExecutionCompleted,
    WorkflowExecutionFailed,
    TriggerChecked,
    TriggerFired,
    ActionStarted,
    ActionCompleted,
    ActionFailed,
    TokenRefreshed,
}

/// One row in the append-only log. Never updated after insertion.
///
/// `workflow_id`/`run_id` are nullable at the storage layer: the log is the
/// audit trail and outlives the workflow or run it was recorded against, so
/// deleting either sets these to `NULL` rather than cascading the delete
/// into `log` (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub workflow_id: Option<Uuid>,
    pub run_id: Option<Uuid>,
    pub event_type: EventType,
    pub step_id: Option<String>,
    pub message: String,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(
        workflow_id: Uuid,
        run_id: Option<Uuid>,
        event_type: EventType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id: Some(workflow_id),
            run_id,
            event_type,
            step_id: None,
            message: message.into(),
            detail: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    pub fn with_step(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = Some(step_id.into());
        self
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }
}
