//! Manual row-to-model loading for `Workflow`/`User`, following the same
//! `row.get(...)` convention as `core-credentials::store` and the teacher's
//! `workflow_trigger.rs::load_triggers` rather than `sqlx::FromRow` derive
//! (keeps `core-models` free of a `sqlx` dependency).

use chrono::{DateTime, Utc};
use core_models::{Step, User, Workflow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::EngineError;

pub struct WorkflowStore {
    pool: PgPool,
}

fn row_to_workflow(row: &sqlx::postgres::PgRow) -> Result<Workflow, EngineError> {
    let steps_json: serde_json::Value = row.get("steps");
    let steps: Vec<Step> = serde_json::from_value(steps_json)?;

    Ok(Workflow {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        description: row.get("description"),
        is_active: row.get("is_active"),
        polling_interval_seconds: row.get("polling_interval_seconds"),
        last_run_at: row.get("last_run_at"),
        steps,
        start_step_id: row.get("start_step_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("user_id"),
        email: row.get("user_email"),
        name: row.get("user_name"),
        created_at: row.get("user_created_at"),
    }
}

impl WorkflowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// §4.6 step 1: every active workflow, eagerly joined with its owner.
    pub async fn list_active_with_owner(&self) -> Result<Vec<(Workflow, User)>, EngineError> {
        let rows = sqlx::query(
            r#"
            SELECT
                w.id, w.user_id, w.name, w.description, w.is_active,
                w.polling_interval_seconds, w.last_run_at, w.steps,
                w.start_step_id, w.created_at, w.updated_at,
                u.id AS user_id_dup, u.email AS user_email, u.name AS user_name,
                u.created_at AS user_created_at
            FROM workflow w
            JOIN "user" u ON u.id = w.user_id
            WHERE w.is_active = true
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|r| Ok((row_to_workflow(r)?, row_to_user(r)))).collect()
    }

    pub async fn get_with_owner(&self, workflow_id: Uuid) -> Result<Option<(Workflow, User)>, EngineError> {
        let row = sqlx::query(
            r#"
            SELECT
                w.id, w.user_id, w.name, w.description, w.is_active,
                w.polling_interval_seconds, w.last_run_at, w.steps,
                w.start_step_id, w.created_at, w.updated_at,
                u.id AS user_id_dup, u.email AS user_email, u.name AS user_name,
                u.created_at AS user_created_at
            FROM workflow w
            JOIN "user" u ON u.id = w.user_id
            WHERE w.id = $1
            "#,
        )
        .bind(workflow_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(|r| Ok((row_to_workflow(r)?, row_to_user(r)))).transpose()
    }

    /// §4.6 step 4/5: a targeted field write — never touches `steps` or
    /// other relations on the workflow row.
    pub async fn touch_last_run_at(&self, workflow_id: Uuid, at: DateTime<Utc>) -> Result<(), EngineError> {
        sqlx::query("UPDATE workflow SET last_run_at = $2 WHERE id = $1")
            .bind(workflow_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn create(&self, workflow: &Workflow) -> Result<(), EngineError> {
        let steps_json = serde_json::to_value(&workflow.steps)?;
        sqlx::query(
            r#"
            INSERT INTO workflow
                (id, user_id, name, description, is_active, polling_interval_seconds,
                 last_run_at, steps, start_step_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(workflow.id)
        .bind(workflow.user_id)
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(workflow.is_active)
        .bind(workflow.polling_interval_seconds)
        .bind(workflow.last_run_at)
        .bind(&steps_json)
        .bind(&workflow.start_step_id)
        .bind(workflow.created_at)
        .bind(workflow.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_all(&self, user_id: Uuid) -> Result<Vec<Workflow>, EngineError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, description, is_active, polling_interval_seconds,
                   last_run_at, steps, start_step_id, created_at, updated_at
            FROM workflow
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_workflow).collect()
    }

    pub async fn find_one(&self, workflow_id: Uuid) -> Result<Option<Workflow>, EngineError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, description, is_active, polling_interval_seconds,
                   last_run_at, steps, start_step_id, created_at, updated_at
            FROM workflow
            WHERE id = $1
            "#,
        )
        .bind(workflow_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_workflow).transpose()
    }

    /// Full replace of the mutable fields on a workflow row (§6 `update`).
    pub async fn update(&self, workflow: &Workflow) -> Result<(), EngineError> {
        let steps_json = serde_json::to_value(&workflow.steps)?;
        sqlx::query(
            r#"
            UPDATE workflow
            SET name = $2, description = $3, is_active = $4, polling_interval_seconds = $5,
                last_run_at = $6, steps = $7, start_step_id = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(workflow.id)
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(workflow.is_active)
        .bind(workflow.polling_interval_seconds)
        .bind(workflow.last_run_at)
        .bind(&steps_json)
        .bind(&workflow.start_step_id)
        .bind(workflow.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, workflow_id: Uuid) -> Result<(), EngineError> {
        sqlx::query("DELETE FROM workflow WHERE id = $1")
            .bind(workflow_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
