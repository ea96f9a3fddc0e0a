//! Executor (C8) — a fixed-size pool of `tokio::spawn`ed workers pulling
//! from the `JobQueue`, structured like the teacher's `Worker`/`WorkerPool`.

use std::sync::Arc;

use core_integrations::Dispatcher;
use core_models::{EventType, LogEntry, WorkflowRun};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::TerminalFailureMode;
use crate::dedup::DedupStore;
use crate::event_log::EventLog;
use crate::queue::{Job, JobQueue};
use crate::run_store::RunStore;
use crate::workflow_store::WorkflowStore;

const DEQUEUE_TIMEOUT_SECONDS: u64 = 5;

struct Worker {
    id: usize,
    queue: Arc<JobQueue>,
    workflows: Arc<WorkflowStore>,
    runs: Arc<RunStore>,
    dedup: Arc<DedupStore>,
    dispatcher: Arc<Dispatcher>,
    event_log: Arc<EventLog>,
    on_terminal_failure: TerminalFailureMode,
}

impl Worker {
    fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(worker_id = self.id, "executor worker started");
            loop {
                match self.process_next().await {
                    Ok(true) => {}
                    Ok(false) => {
                        // No job available within the dequeue timeout.
                    }
                    Err(e) => {
                        error!(worker_id = self.id, error = %e, "executor worker error");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }
            }
        })
    }

    async fn process_next(&self) -> Result<bool, crate::error::EngineError> {
        let Some(job) = self.queue.dequeue(DEQUEUE_TIMEOUT_SECONDS).await? else {
            return Ok(false);
        };

        info!(worker_id = self.id, job_id = %job.id, workflow_id = %job.workflow_id, "processing job");

        let Some((workflow, user)) = self.workflows.get_with_owner(job.workflow_id).await? else {
            error!(job_id = %job.id, workflow_id = %job.workflow_id, "workflow or owner missing, terminal failure");
            self.queue
                .fail(job.id, "workflow or owner not found".to_string(), false, self.on_terminal_failure)
                .await?;
            return Ok(true);
        };

        let mut run = WorkflowRun::new(workflow.id, job.trigger_external_id.clone(), job.trigger_data.clone(), job.retry_count);
        self.runs.create(&run).await?;

        self.event_log
            .create(&LogEntry::new(workflow.id, Some(run.id), EventType::WorkflowExecutionStarted, "execution started"))
            .await?;

        // Accommodates both scheduler-wrapped (`{"data": {...}}`) and
        // directly-constructed payloads.
        let unwrapped = job.trigger_data.get("data").cloned().unwrap_or_else(|| job.trigger_data.clone());

        match core_workflow_engine::interpret(&self.dispatcher, &user, &workflow, &unwrapped).await {
            Ok(log) => {
                self.on_success(&job, &workflow, &mut run, log).await?;
            }
            Err(e) => {
                self.on_failure(&job, &workflow, &mut run, &e).await?;
            }
        }

        Ok(true)
    }

    async fn on_success(
        &self,
        job: &Job,
        workflow: &core_models::Workflow,
        run: &mut WorkflowRun,
        log: Vec<core_workflow_engine::StepRecord>,
    ) -> Result<(), crate::error::EngineError> {
        run.mark_completed();
        let execution_log = serde_json::to_value(&log)?;
        self.runs.mark_completed(run, &execution_log).await?;
        self.workflows.touch_last_run_at(workflow.id, chrono::Utc::now()).await?;

        if let Some(trigger) = workflow.trigger_step() {
            self.dedup
                .record(workflow.id, &trigger.trigger_id, &job.trigger_external_id)
                .await?;
        }

        self.event_log
            .create(&LogEntry::new(workflow.id, Some(run.id), EventType::WorkflowExecutionCompleted, "execution completed"))
            .await?;
        self.queue.complete(job.id).await?;
        Ok(())
    }

    async fn on_failure(
        &self,
        job: &Job,
        workflow: &core_models::Workflow,
        run: &mut WorkflowRun,
        error: &core_workflow_engine::WorkflowEngineError,
    ) -> Result<(), crate::error::EngineError> {
        run.mark_failed(error.to_string());
        self.runs.mark_failed(run).await?;

        self.event_log
            .create(
                &LogEntry::new(workflow.id, Some(run.id), EventType::WorkflowExecutionFailed, "execution failed")
                    .with_detail(serde_json::json!({ "error": error.to_string() })),
            )
            .await?;

        self.queue
            .fail(job.id, error.to_string(), error.is_retryable(), self.on_terminal_failure)
            .await?;
        Ok(())
    }
}

pub struct ExecutorPool {
    handles: Vec<JoinHandle<()>>,
}

impl ExecutorPool {
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        concurrency: usize,
        queue: Arc<JobQueue>,
        workflows: Arc<WorkflowStore>,
        runs: Arc<RunStore>,
        dedup: Arc<DedupStore>,
        dispatcher: Arc<Dispatcher>,
        event_log: Arc<EventLog>,
        on_terminal_failure: TerminalFailureMode,
    ) -> Self {
        let handles = (0..concurrency)
            .map(|id| {
                Worker {
                    id,
                    queue: Arc::clone(&queue),
                    workflows: Arc::clone(&workflows),
                    runs: Arc::clone(&runs),
                    dedup: Arc::clone(&dedup),
                    dispatcher: Arc::clone(&dispatcher),
                    event_log: Arc::clone(&event_log),
                    on_terminal_failure,
                }
                .start()
            })
            .collect();

        Self { handles }
    }

    pub async fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}
