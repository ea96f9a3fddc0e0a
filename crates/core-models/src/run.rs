//! Workflow execution record (§3, §4.8 C8).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

/// One attempt at executing a workflow's step graph for a single trigger
/// occurrence. Created already `Running` (the executor only ever builds one
/// once it has dequeued the job); terminal once `status` leaves `Running`
/// (§8 I6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub trigger_external_id: String,
    pub status: RunStatus,
    pub current_step_id: Option<String>,
    pub trigger_payload: serde_json::Value,
    /// The job's `attempts_made` at the time this run was created; bumped
    /// by one on failure (§4.8 step 7). Each retry of the same job creates
    /// a distinct `WorkflowRun` row rather than mutating this one.
    pub retry_count: u32,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    pub fn new(
        workflow_id: Uuid,
        trigger_external_id: impl Into<String>,
        trigger_payload: serde_json::Value,
        retry_count: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            trigger_external_id: trigger_external_id.into(),
            status: RunStatus::Running,
            current_step_id: None,
            trigger_payload,
            retry_count,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn advance(&mut self, step_id: impl Into<String>) {
        self.current_step_id = Some(step_id.into());
    }

    pub fn mark_completed(&mut self) {
        self.status = RunStatus::Success;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.retry_count += 1;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, RunStatus::Success | RunStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_run_starts_running_and_not_terminal() {
        let run = WorkflowRun::new(Uuid::new_v4(), "m1", serde_json::json!({}), 0);
        assert_eq!(run.status, RunStatus::Running);
        assert!(!run.is_terminal());
        assert_eq!(run.retry_count, 0);
    }

    #[test]
    fn mark_failed_bumps_retry_count_and_terminates() {
        let mut run = WorkflowRun::new(Uuid::new_v4(), "m1", serde_json::json!({}), 1);
        run.mark_failed("timeout");
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.retry_count, 2);
        assert!(run.is_terminal());
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn mark_completed_terminates_without_touching_retry_count() {
        let mut run = WorkflowRun::new(Uuid::new_v4(), "m1", serde_json::json!({}), 0);
        run.mark_completed();
        assert_eq!(run.status, RunStatus::Success);
        assert_eq!(run.retry_count, 0);
    }
}
