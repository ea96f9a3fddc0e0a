//! Job Queue (C7) — Redis-backed, directly generalizing the teacher's
//! `backend-api::jobs::queue::JobQueue`: same `rpush`/`blpop` main list,
//! `zadd`/`zrangebyscore_limit` delayed set, `dead_letter` list. Adds
//! `remove_jobs_for`, a capability the teacher's queue never needed because
//! it has no per-entity cancellation story.

use chrono::{DateTime, Duration, Utc};
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TerminalFailureMode;
use crate::error::EngineError;

const MAIN_LIST: &str = "engine:jobs";
const SCHEDULED_SET: &str = "engine:jobs:scheduled";
const DEAD_LETTER_LIST: &str = "engine:jobs:dead_letter";
const JOB_TTL_SECONDS: u64 = 86_400;
pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub trigger_external_id: String,
    pub trigger_data: serde_json::Value,
    pub max_retries: u32,
    pub retry_count: u32,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Retrying,
}

pub struct JobQueue {
    client: Client,
}

impl JobQueue {
    pub fn new(redis_url: &str) -> Result<Self, EngineError> {
        Ok(Self { client: Client::open(redis_url)? })
    }

    /// Enqueue a trigger occurrence for execution (§4.8 step 1 origin).
    pub async fn enqueue(
        &self,
        workflow_id: Uuid,
        trigger_external_id: String,
        trigger_data: serde_json::Value,
    ) -> Result<Uuid, EngineError> {
        let mut conn = self.client.get_async_connection().await?;

        let job = Job {
            id: Uuid::new_v4(),
            workflow_id,
            trigger_external_id,
            trigger_data,
            max_retries: MAX_ATTEMPTS,
            retry_count: 0,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            scheduled_at: None,
            started_at: None,
            completed_at: None,
            error: None,
        };

        let job_json = serde_json::to_string(&job)?;
        conn.rpush(MAIN_LIST, &job_json).await?;
        conn.set_ex(format!("engine:job:{}", job.id), &job_json, JOB_TTL_SECONDS).await?;

        Ok(job.id)
    }

    /// Dequeue the next job, blocking up to `timeout_secs` (§4.8 step 1).
    pub async fn dequeue(&self, timeout_secs: u64) -> Result<Option<Job>, EngineError> {
        self.promote_scheduled_jobs().await?;

        let mut conn = self.client.get_async_connection().await?;
        let result: Option<(String, String)> = conn.blpop(MAIN_LIST, timeout_secs as usize).await?;

        match result {
            Some((_, job_json)) => {
                let mut job: Job = serde_json::from_str(&job_json)?;
                job.status = JobStatus::Running;
                job.started_at = Some(Utc::now());
                self.persist(&job).await?;
                Ok(Some(job))
            }
            None => Ok(None),
        }
    }

    pub async fn complete(&self, job_id: Uuid) -> Result<(), EngineError> {
        let mut conn = self.client.get_async_connection().await?;
        let key = format!("engine:job:{job_id}");
        let Some(json): Option<String> = conn.get(&key).await? else {
            return Ok(());
        };
        let mut job: Job = serde_json::from_str(&json)?;
        job.status = JobStatus::Completed;
        job.completed_at = Some(Utc::now());
        self.persist(&job).await
    }

    /// Record a failure. Returns `true` if the job was rescheduled with
    /// exponential backoff, `false` if it went straight to its terminal
    /// state. `on_terminal` decides what happens once a job reaches that
    /// terminal state (§9 open question, resolved as a config knob):
    /// `DeadLetter` retains the job for inspection, `DropProcessed` discards
    /// it without a trace beyond the log entry the caller writes.
    ///
    /// `retryable` is the error's own `is_retryable()` verdict (§7): a
    /// non-retryable error (`NotConnected`, `ReauthRequired`, `NotFound`,
    /// `InvalidRequest`) skips the backoff schedule entirely, even if
    /// `retry_count` hasn't yet reached `max_retries` — retrying a
    /// malformed request or a missing connection can't succeed on replay.
    pub async fn fail(
        &self,
        job_id: Uuid,
        error: String,
        retryable: bool,
        on_terminal: TerminalFailureMode,
    ) -> Result<bool, EngineError> {
        let mut conn = self.client.get_async_connection().await?;
        let key = format!("engine:job:{job_id}");
        let Some(json): Option<String> = conn.get(&key).await? else {
            return Ok(false);
        };
        let mut job: Job = serde_json::from_str(&json)?;
        job.retry_count += 1;
        job.error = Some(error);

        if retryable && job.retry_count < job.max_retries {
            job.status = JobStatus::Retrying;
            let backoff_secs = 2_i64.pow(job.retry_count);
            let retry_at = Utc::now() + Duration::seconds(backoff_secs);
            job.scheduled_at = Some(retry_at);

            let job_json = serde_json::to_string(&job)?;
            conn.zadd(SCHEDULED_SET, &job_json, retry_at.timestamp()).await?;
            conn.set_ex(&key, &job_json, JOB_TTL_SECONDS).await?;
            Ok(true)
        } else {
            job.status = JobStatus::Failed;
            job.completed_at = Some(Utc::now());
            let job_json = serde_json::to_string(&job)?;

            match on_terminal {
                TerminalFailureMode::DeadLetter => {
                    conn.set_ex(&key, &job_json, JOB_TTL_SECONDS).await?;
                    conn.rpush(DEAD_LETTER_LIST, &job_json).await?;
                }
                TerminalFailureMode::DropProcessed => {
                    conn.del(&key).await?;
                }
            }
            Ok(false)
        }
    }

    /// Remove every queued/scheduled job belonging to `workflow_id` (used
    /// when a workflow is deactivated or deleted, so an in-flight trigger
    /// it already queued doesn't execute after the fact).
    pub async fn remove_jobs_for(&self, workflow_id: Uuid) -> Result<usize, EngineError> {
        let mut conn = self.client.get_async_connection().await?;
        let mut removed = 0usize;

        let main: Vec<String> = conn.lrange(MAIN_LIST, 0, -1).await?;
        for entry in &main {
            if job_belongs_to(entry, workflow_id) {
                let n: usize = conn.lrem(MAIN_LIST, 0, entry).await?;
                removed += n;
            }
        }

        let scheduled: Vec<String> = conn.zrange(SCHEDULED_SET, 0, -1).await?;
        for entry in &scheduled {
            if job_belongs_to(entry, workflow_id) {
                let n: usize = conn.zrem(SCHEDULED_SET, entry).await?;
                removed += n;
            }
        }

        Ok(removed)
    }

    async fn promote_scheduled_jobs(&self) -> Result<(), EngineError> {
        let mut conn = self.client.get_async_connection().await?;
        let now = Utc::now().timestamp();

        let ready: Vec<String> = conn.zrangebyscore_limit(SCHEDULED_SET, 0, now, 0, 100).await?;
        for job_json in ready {
            conn.rpush(MAIN_LIST, &job_json).await?;
            conn.zrem(SCHEDULED_SET, &job_json).await?;
        }
        Ok(())
    }

    async fn persist(&self, job: &Job) -> Result<(), EngineError> {
        let mut conn = self.client.get_async_connection().await?;
        let key = format!("engine:job:{}", job.id);
        let job_json = serde_json::to_string(job)?;
        conn.set_ex(&key, job_json, JOB_TTL_SECONDS).await?;
        Ok(())
    }
}

fn job_belongs_to(job_json: &str, workflow_id: Uuid) -> bool {
    serde_json::from_str::<Job>(job_json)
        .map(|j| j.workflow_id == workflow_id)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_belongs_to_matches_workflow_id() {
        let wf = Uuid::new_v4();
        let job = Job {
            id: Uuid::new_v4(),
            workflow_id: wf,
            trigger_external_id: "ext1".into(),
            trigger_data: serde_json::json!({}),
            max_retries: MAX_ATTEMPTS,
            retry_count: 0,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            scheduled_at: None,
            started_at: None,
            completed_at: None,
            error: None,
        };
        let json = serde_json::to_string(&job).unwrap();
        assert!(job_belongs_to(&json, wf));
        assert!(!job_belongs_to(&json, Uuid::new_v4()));
    }
}
