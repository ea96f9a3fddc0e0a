use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("ENCRYPTION_KEY is not set")]
    MissingKey,

    #[error("ENCRYPTION_KEY must be 32 bytes hex-encoded")]
    MalformedKey,

    #[error("no credential stored for this user/app")]
    NotFound,
}
