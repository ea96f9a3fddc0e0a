//! The closed error-kind taxonomy shared by every adapter and the dispatcher (§7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrationError {
    /// No credential row for this (user, app).
    #[error("not connected")]
    NotConnected,

    /// Token refresh failed, or the provider rejected a request with 401/403
    /// after a refresh attempt.
    #[error("reauthorization required")]
    ReauthRequired,

    #[error("resource not found")]
    NotFound,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// 429, with the provider's retry-after hint when present.
    #[error("rate limited, retry after {retry_after_seconds:?}s")]
    RateLimited { retry_after_seconds: Option<u64> },

    /// Network errors, 5xx, timeouts.
    #[error("transient error: {0}")]
    Transient(String),

    /// A 200 response whose body carries `ok: false` (Slack-style).
    #[error("provider error: {0}")]
    ProviderError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntegrationError {
    /// Whether the queue should retry a job that failed with this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IntegrationError::RateLimited { .. }
                | IntegrationError::Transient(_)
                | IntegrationError::ProviderError(_)
        )
    }

    pub fn from_status(status: reqwest::StatusCode, retry_after_seconds: Option<u64>) -> Self {
        match status.as_u16() {
            401 | 403 => IntegrationError::ReauthRequired,
            404 => IntegrationError::NotFound,
            429 => IntegrationError::RateLimited { retry_after_seconds },
            s if s >= 500 => IntegrationError::Transient(format!("http {s}")),
            s if (400..500).contains(&s) => IntegrationError::InvalidRequest(format!("http {s}")),
            s => IntegrationError::Internal(format!("unexpected status {s}")),
        }
    }
}

impl From<reqwest::Error> for IntegrationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            IntegrationError::Transient(e.to_string())
        } else {
            IntegrationError::Internal(e.to_string())
        }
    }
}

impl From<core_credentials::CredentialError> for IntegrationError {
    fn from(e: core_credentials::CredentialError) -> Self {
        IntegrationError::Internal(e.to_string())
    }
}
