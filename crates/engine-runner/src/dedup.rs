//! Dedup Store (C5) — pure persistence over `processed_triggers`, kept as a
//! module rather than its own crate (it has no third-party collaborators
//! besides sqlx, the same reasoning the teacher applies to keeping
//! `workflow_trigger.rs` a module of `backend-api`).

use core_triggers::TriggerCandidate;
use sqlx::{PgPool, Row};
use tracing::warn;
use uuid::Uuid;

use crate::error::EngineError;

/// Postgres unique_violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

pub struct DedupStore {
    pool: PgPool,
}

impl DedupStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Drops candidates whose `external_id` has already been recorded for
    /// this `(workflow_id, trigger_type)` pair (§8 I3).
    pub async fn filter(
        &self,
        workflow_id: Uuid,
        trigger_type: &str,
        candidates: Vec<TriggerCandidate>,
    ) -> Result<Vec<TriggerCandidate>, EngineError> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let external_ids: Vec<&str> = candidates.iter().map(|c| c.external_id.as_str()).collect();

        let rows = sqlx::query(
            r#"
            SELECT external_id FROM processed_triggers
            WHERE workflow_id = $1 AND trigger_type = $2 AND external_id = ANY($3)
            "#,
        )
        .bind(workflow_id)
        .bind(trigger_type)
        .bind(&external_ids as &[&str])
        .fetch_all(&self.pool)
        .await?;

        let seen: std::collections::HashSet<String> =
            rows.into_iter().map(|r| r.get::<String, _>("external_id")).collect();

        Ok(candidates.into_iter().filter(|c| !seen.contains(&c.external_id)).collect())
    }

    /// Record a trigger occurrence as processed. A unique-violation means
    /// another sweep already recorded it concurrently — not an error.
    pub async fn record(
        &self,
        workflow_id: Uuid,
        trigger_type: &str,
        external_id: &str,
    ) -> Result<(), EngineError> {
        let result = sqlx::query(
            r#"
            INSERT INTO processed_triggers (id, workflow_id, trigger_type, external_id, metadata, processed_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(workflow_id)
        .bind(trigger_type)
        .bind(external_id)
        .bind(serde_json::Value::Null)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(ref db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                warn!(workflow_id = %workflow_id, external_id, "trigger already recorded, skipping");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
