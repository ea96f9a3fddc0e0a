//! Event Log (C10) — append-only, persisted rows, queried by workflow or
//! run with an optional event-type filter and a capped result size.

use core_models::{EventType, LogEntry};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::EngineError;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

pub struct EventLog {
    pool: PgPool,
}

fn event_type_str(event_type: EventType) -> &'static str {
    match event_type {
        EventType::WorkflowCreated => "workflow_created",
        EventType::WorkflowActivated => "workflow_activated",
        EventType::WorkflowDeactivated => "workflow_deactivated",
        EventType::WorkflowExecutionStarted => "workflow_execution_started",
        EventType::WorkflowExecutionCompleted => "workflow_execution_completed",
        EventType::WorkflowExecutionFailed => "workflow_execution_failed",
        EventType::TriggerChecked => "trigger_checked",
        EventType::TriggerFired => "trigger_fired",
        EventType::ActionStarted => "action_started",
        EventType::ActionCompleted => "action_completed",
        EventType::ActionFailed => "action_failed",
        EventType::TokenRefreshed => "token_refreshed",
    }
}

fn event_type_from_str(s: &str) -> EventType {
    match s {
        "workflow_created" => EventType::WorkflowCreated,
        "workflow_activated" => EventType::WorkflowActivated,
        "workflow_deactivated" => EventType::WorkflowDeactivated,
        "workflow_execution_started" => EventType::WorkflowExecutionStarted,
        "workflow_execution_completed" => EventType::WorkflowExecutionCompleted,
        "workflow_execution_failed" => EventType::WorkflowExecutionFailed,
        "trigger_checked" => EventType::TriggerChecked,
        "trigger_fired" => EventType::TriggerFired,
        "action_started" => EventType::ActionStarted,
        "action_completed" => EventType::ActionCompleted,
        "action_failed" => EventType::ActionFailed,
        _ => EventType::TokenRefreshed,
    }
}

fn row_to_entry(row: &sqlx::postgres::PgRow) -> LogEntry {
    let event_type_str: String = row.get("event_type");
    LogEntry {
        id: row.get("id"),
        workflow_id: row.get("workflow_id"),
        run_id: row.get("run_id"),
        event_type: event_type_from_str(&event_type_str),
        step_id: row.get("step_id"),
        message: row.get("message"),
        detail: row.get("detail"),
        created_at: row.get("created_at"),
    }
}

impl EventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, entry: &LogEntry) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO log (id, workflow_id, run_id, event_type, step_id, message, detail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.workflow_id)
        .bind(entry.run_id)
        .bind(event_type_str(entry.event_type))
        .bind(&entry.step_id)
        .bind(&entry.message)
        .bind(&entry.detail)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Rows for one workflow, newest first, optionally restricted to one
    /// `event_type`, capped at `limit` (default 100, hard max 500).
    pub async fn for_workflow(
        &self,
        workflow_id: Uuid,
        event_type: Option<EventType>,
        limit: Option<i64>,
    ) -> Result<Vec<LogEntry>, EngineError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT).max(1);
        let rows = sqlx::query(
            r#"
            SELECT id, workflow_id, run_id, event_type, step_id, message, detail, created_at
            FROM log
            WHERE workflow_id = $1 AND ($2::text IS NULL OR event_type = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(workflow_id)
        .bind(event_type.map(event_type_str))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_entry).collect())
    }

    pub async fn for_run(&self, run_id: Uuid, limit: Option<i64>) -> Result<Vec<LogEntry>, EngineError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT).max(1);
        let rows = sqlx::query(
            r#"
            SELECT id, workflow_id, run_id, event_type, step_id, message, detail, created_at
            FROM log
            WHERE run_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(run_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_entry).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_strings_round_trip() {
        for event_type in [
            EventType::WorkflowCreated,
            EventType::TriggerFired,
            EventType::ActionCompleted,
            EventType::TokenRefreshed,
        ] {
            let s = event_type_str(event_type);
            assert_eq!(event_type_str(event_type_from_str(s)), s);
        }
    }

    #[test]
    fn caps_limit_at_hard_max() {
        assert_eq!(DEFAULT_LIMIT.min(MAX_LIMIT).max(1), DEFAULT_LIMIT);
        assert_eq!(10_000_i64.min(MAX_LIMIT), MAX_LIMIT);
    }
}
