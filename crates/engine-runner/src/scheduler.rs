//! Scheduler (C6) — a single periodic loop at a fixed tick, structured
//! exactly like the teacher's `ScheduledTriggerRunner::start`/
//! `JobScheduler::start`. §4.6 steps 1-5, sequential within a tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use core_integrations::Dispatcher;
use core_models::{EventType, LogEntry};
use tracing::error;

use crate::dedup::DedupStore;
use crate::event_log::EventLog;
use crate::queue::JobQueue;
use crate::workflow_store::WorkflowStore;

pub struct Scheduler {
    workflows: Arc<WorkflowStore>,
    dedup: Arc<DedupStore>,
    queue: Arc<JobQueue>,
    dispatcher: Arc<Dispatcher>,
    event_log: Arc<EventLog>,
    tick: Duration,
}

impl Scheduler {
    pub fn new(
        workflows: Arc<WorkflowStore>,
        dedup: Arc<DedupStore>,
        queue: Arc<JobQueue>,
        dispatcher: Arc<Dispatcher>,
        event_log: Arc<EventLog>,
        tick: Duration,
    ) -> Self {
        Self { workflows, dedup, queue, dispatcher, event_log, tick }
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep().await {
                error!(error = %e, "scheduler sweep failed");
            }
        }
    }

    async fn sweep(&self) -> Result<(), crate::error::EngineError> {
        let active = self.workflows.list_active_with_owner().await?;
        let now = Utc::now();

        for (workflow, user) in active {
            let Some(trigger) = workflow.trigger_step() else {
                continue;
            };

            let next_run_at = workflow
                .last_run_at
                .map(|last| last + chrono::Duration::seconds(workflow.polling_interval_seconds))
                .unwrap_or(chrono::DateTime::<Utc>::UNIX_EPOCH);
            if next_run_at > now {
                continue;
            }

            self.event_log
                .create(&LogEntry::new(workflow.id, None, EventType::TriggerChecked, "polling trigger"))
                .await?;

            let candidates = match core_triggers::detect(&self.dispatcher, &user, trigger).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    error!(workflow_id = %workflow.id, error = %e, "detector failed, skipping this tick");
                    continue;
                }
            };

            let unprocessed = self.dedup.filter(workflow.id, &trigger.trigger_id, candidates).await?;

            if unprocessed.is_empty() {
                self.workflows.touch_last_run_at(workflow.id, now).await?;
                continue;
            }

            // Newest-first ordered and dedup-filtered: the first entry is
            // the most recent unprocessed event.
            let chosen = &unprocessed[0];

            self.event_log
                .create(
                    &LogEntry::new(workflow.id, None, EventType::TriggerFired, "trigger fired")
                        .with_detail(serde_json::json!({ "external_id": chosen.external_id })),
                )
                .await?;

            self.queue
                .enqueue(workflow.id, chosen.external_id.clone(), chosen.data.clone())
                .await?;

            self.workflows.touch_last_run_at(workflow.id, now).await?;
        }

        Ok(())
    }
}
