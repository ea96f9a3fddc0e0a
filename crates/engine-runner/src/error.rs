//! engine-runner's own error enum, wrapping its collaborators' errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Credential(#[from] core_credentials::CredentialError),

    #[error(transparent)]
    Integration(#[from] core_integrations::IntegrationError),

    #[error(transparent)]
    Workflow(#[from] core_workflow_engine::WorkflowEngineError),

    #[error(transparent)]
    Validation(#[from] core_models::WorkflowValidationError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}
