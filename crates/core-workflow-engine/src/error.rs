use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowEngineError {
    #[error(transparent)]
    Integration(#[from] core_integrations::IntegrationError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl WorkflowEngineError {
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkflowEngineError::Integration(e) => e.is_retryable(),
            WorkflowEngineError::InvalidRequest(_) => false,
        }
    }
}
