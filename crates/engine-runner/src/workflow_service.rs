//! `WorkflowService` (§6) — the in-process operations an (out-of-scope)
//! CRUD/HTTP layer would call: `create_workflow`, `activate`, `deactivate`,
//! `find_all`, `find_one`, `update`, `remove`, `test`, and the log-query
//! operations. A thin wrapper over the stores/dispatcher this crate already
//! builds — it adds no persistence or execution logic of its own.

use std::sync::Arc;

use core_integrations::Dispatcher;
use core_models::{EventType, LogEntry, Step, User, Workflow};
use uuid::Uuid;

use crate::error::EngineError;
use crate::event_log::EventLog;
use crate::queue::JobQueue;
use crate::workflow_store::WorkflowStore;

pub struct WorkflowService {
    workflows: Arc<WorkflowStore>,
    queue: Arc<JobQueue>,
    event_log: Arc<EventLog>,
    dispatcher: Arc<Dispatcher>,
}

impl WorkflowService {
    pub fn new(
        workflows: Arc<WorkflowStore>,
        queue: Arc<JobQueue>,
        event_log: Arc<EventLog>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self { workflows, queue, event_log, dispatcher }
    }

    pub async fn create_workflow(
        &self,
        user_id: Uuid,
        name: impl Into<String>,
        steps: Vec<Step>,
    ) -> Result<Workflow, EngineError> {
        let workflow = Workflow::new(user_id, name, steps);
        workflow.validate()?;
        self.workflows.create(&workflow).await?;
        self.event_log
            .create(&LogEntry::new(workflow.id, None, EventType::WorkflowCreated, "workflow created"))
            .await?;
        Ok(workflow)
    }

    pub async fn find_all(&self, user_id: Uuid) -> Result<Vec<Workflow>, EngineError> {
        self.workflows.find_all(user_id).await
    }

    pub async fn find_one(&self, workflow_id: Uuid) -> Result<Option<Workflow>, EngineError> {
        self.workflows.find_one(workflow_id).await
    }

    /// Replaces the full step graph and re-validates it (§8 I5) before
    /// writing — an update can't leave a workflow in a broken state.
    pub async fn update(&self, mut workflow: Workflow) -> Result<Workflow, EngineError> {
        workflow.validate()?;
        workflow.updated_at = chrono::Utc::now();
        self.workflows.update(&workflow).await?;
        Ok(workflow)
    }

    pub async fn activate(&self, workflow_id: Uuid) -> Result<Workflow, EngineError> {
        let mut workflow = self
            .workflows
            .find_one(workflow_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(workflow_id.to_string()))?;
        workflow.validate()?;
        workflow.activate();
        self.workflows.update(&workflow).await?;
        self.event_log
            .create(&LogEntry::new(workflow.id, None, EventType::WorkflowActivated, "workflow activated"))
            .await?;
        Ok(workflow)
    }

    /// Deactivating also drops any job already queued for this workflow
    /// (§4.7 `remove_jobs_for`) — a trigger that fired just before
    /// deactivation shouldn't still execute afterwards.
    pub async fn deactivate(&self, workflow_id: Uuid) -> Result<Workflow, EngineError> {
        let mut workflow = self
            .workflows
            .find_one(workflow_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(workflow_id.to_string()))?;
        workflow.deactivate();
        self.workflows.update(&workflow).await?;
        self.queue.remove_jobs_for(workflow_id).await?;
        self.event_log
            .create(&LogEntry::new(workflow.id, None, EventType::WorkflowDeactivated, "workflow deactivated"))
            .await?;
        Ok(workflow)
    }

    pub async fn remove(&self, workflow_id: Uuid) -> Result<(), EngineError> {
        self.queue.remove_jobs_for(workflow_id).await?;
        self.workflows.remove(workflow_id).await
    }

    /// §6 `test` — runs `definition` once against `trigger_data` without
    /// persisting a `WorkflowRun`, recording a dedup marker, or touching
    /// the job queue.
    pub async fn test(
        &self,
        user: &User,
        definition: &Workflow,
        trigger_data: &serde_json::Value,
    ) -> Result<Vec<core_workflow_engine::StepRecord>, EngineError> {
        Ok(core_workflow_engine::test(&self.dispatcher, user, definition, trigger_data).await?)
    }

    pub async fn logs_for_workflow(
        &self,
        workflow_id: Uuid,
        event_type: Option<EventType>,
        limit: Option<i64>,
    ) -> Result<Vec<LogEntry>, EngineError> {
        self.event_log.for_workflow(workflow_id, event_type, limit).await
    }

    pub async fn logs_for_run(&self, run_id: Uuid, limit: Option<i64>) -> Result<Vec<LogEntry>, EngineError> {
        self.event_log.for_run(run_id, limit).await
    }
}
