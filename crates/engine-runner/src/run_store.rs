//! Persistence for `WorkflowRun` rows (§3, §4.8 steps 3/6/7).

use core_models::{RunStatus, WorkflowRun};
use sqlx::PgPool;

use crate::error::EngineError;

pub struct RunStore {
    pool: PgPool,
}

impl RunStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, run: &WorkflowRun) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO workflow_run
                (id, workflow_id, trigger_external_id, status, current_step_id,
                 trigger_payload, retry_count, error, started_at, finished_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(run.id)
        .bind(run.workflow_id)
        .bind(&run.trigger_external_id)
        .bind(status_str(run.status))
        .bind(&run.current_step_id)
        .bind(&run.trigger_payload)
        .bind(run.retry_count as i32)
        .bind(&run.error)
        .bind(run.started_at)
        .bind(run.finished_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_completed(&self, run: &WorkflowRun, execution_log: &serde_json::Value) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            UPDATE workflow_run
            SET status = $2, finished_at = $3, current_step_id = $4, execution_log = $5
            WHERE id = $1
            "#,
        )
        .bind(run.id)
        .bind(status_str(run.status))
        .bind(run.finished_at)
        .bind(&run.current_step_id)
        .bind(execution_log)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(&self, run: &WorkflowRun) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            UPDATE workflow_run
            SET status = $2, finished_at = $3, retry_count = $4, error = $5
            WHERE id = $1
            "#,
        )
        .bind(run.id)
        .bind(status_str(run.status))
        .bind(run.finished_at)
        .bind(run.retry_count as i32)
        .bind(&run.error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn status_str(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Running => "running",
        RunStatus::Success => "success",
        RunStatus::Failed => "failed",
    }
}
