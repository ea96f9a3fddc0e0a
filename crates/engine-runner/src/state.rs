//! Wiring for the long-lived handles the engine's background tasks share —
//! constructed once, passed down as `Arc`s, never ambient globals (§5,
//! matching the teacher's `backend-api::state::AppState`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use core_credentials::CredentialStore;
use core_integrations::Dispatcher;
use core_notify::{Notifier, TracingNotifier};
use sqlx::PgPool;

use crate::config::Config;
use crate::dedup::DedupStore;
use crate::event_log::EventLog;
use crate::queue::JobQueue;
use crate::run_store::RunStore;
use crate::workflow_service::WorkflowService;
use crate::workflow_store::WorkflowStore;

pub struct EngineState {
    pub pool: PgPool,
    pub dispatcher: Arc<Dispatcher>,
    pub workflows: Arc<WorkflowStore>,
    pub runs: Arc<RunStore>,
    pub dedup: Arc<DedupStore>,
    pub event_log: Arc<EventLog>,
    pub queue: Arc<JobQueue>,
    pub workflow_service: Arc<WorkflowService>,
}

impl EngineState {
    pub fn new(pool: PgPool, config: &Config, encryption_key: [u8; 32]) -> Result<Self, crate::error::EngineError> {
        let credentials = Arc::new(CredentialStore::new(pool.clone(), encryption_key));
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
        let oauth_configs: HashMap<_, _> = config.oauth_configs.clone();
        let webhook_timeout = Duration::from_secs(config.webhook_timeout_seconds);
        let dispatcher = Arc::new(Dispatcher::new(credentials, notifier, oauth_configs, webhook_timeout));

        let workflows = Arc::new(WorkflowStore::new(pool.clone()));
        let event_log = Arc::new(EventLog::new(pool.clone()));
        let queue = Arc::new(JobQueue::new(&config.redis_url)?);
        let workflow_service = Arc::new(WorkflowService::new(
            Arc::clone(&workflows),
            Arc::clone(&queue),
            Arc::clone(&event_log),
            Arc::clone(&dispatcher),
        ));

        Ok(Self {
            pool: pool.clone(),
            dispatcher,
            workflows,
            runs: Arc::new(RunStore::new(pool.clone())),
            dedup: Arc::new(DedupStore::new(pool.clone())),
            event_log,
            queue,
            workflow_service,
        })
    }
}
