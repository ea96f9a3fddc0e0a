//! Manual/test-run invocation (§2) — runs a workflow definition once against
//! a supplied trigger payload, independent of the Dedup Store and Job Queue.
//! The same interpreter the real executor uses; this just skips persistence
//! and dedup bookkeeping, for a one-shot "try this workflow" call.

use core_integrations::Dispatcher;
use core_models::{User, Workflow};

use crate::context::StepRecord;
use crate::error::WorkflowEngineError;
use crate::interpreter::interpret;

/// Executes `definition` against `trigger_data` for `user` and returns the
/// step-by-step execution log, without creating a `WorkflowRun` row,
/// recording a dedup marker, or touching the job queue.
pub async fn test(
    dispatcher: &Dispatcher,
    user: &User,
    definition: &Workflow,
    trigger_data: &serde_json::Value,
) -> Result<Vec<StepRecord>, WorkflowEngineError> {
    interpret(dispatcher, user, definition, trigger_data).await
}
