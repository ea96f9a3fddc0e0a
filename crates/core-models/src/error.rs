//! Validation errors for workflow step graphs (§3, §8 I5).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowValidationError {
    #[error("step id {0:?} used more than once")]
    DuplicateStepId(String),

    #[error("workflow must have exactly one trigger step, found {0}")]
    TriggerCount(usize),

    #[error("workflow must have at least one action step")]
    NoActionStep,

    #[error("step target {0:?} does not reference an existing step")]
    DanglingTarget(String),

    #[error("condition template {0:?} does not match the `{{{{path}}}} op 'literal'` grammar")]
    MalformedCondition(String),
}
