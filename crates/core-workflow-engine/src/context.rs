//! The interpreter's execution log — one entry per visited step (§4.9).

use serde::Serialize;

use crate::actions::ActionStatus;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepRecord {
    Condition {
        step_id: String,
        next: Option<String>,
    },
    Action {
        step_id: String,
        #[serde(with = "action_status_serde")]
        status: ActionStatus,
        detail: String,
    },
}

mod action_status_serde {
    use super::ActionStatus;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(status: &ActionStatus, s: S) -> Result<S::Ok, S::Error> {
        match status {
            ActionStatus::Success => s.serialize_str("success"),
            ActionStatus::Failed => s.serialize_str("failed"),
        }
    }
}
