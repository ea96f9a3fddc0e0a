//! Credential model - per-(user, app) OAuth tokens (§3, C1)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A third-party app the engine can connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum App {
    Gmail,
    Slack,
    Github,
    Webhook,
}

impl App {
    pub fn as_str(&self) -> &'static str {
        match self {
            App::Gmail => "gmail",
            App::Slack => "slack",
            App::Github => "github",
            App::Webhook => "webhook",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gmail" => Some(App::Gmail),
            "slack" => Some(App::Slack),
            "github" => Some(App::Github),
            "webhook" => Some(App::Webhook),
            _ => None,
        }
    }

    /// Polling interval derived at workflow activation time (§4.6).
    pub fn default_polling_interval_seconds(&self) -> i64 {
        match self {
            App::Gmail => 60,
            App::Slack => 30,
            App::Github => 60,
            App::Webhook => 0,
        }
    }
}

/// A stored OAuth credential for one (user, app) pair.
///
/// At most one row exists per (user_id, app); `access_token` is never
/// empty; `expires_at`, when present, is UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: Uuid,
    pub user_id: Uuid,
    pub app: App,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Opaque raw provider response (e.g. installing Slack user id).
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// The non-sensitive projection of a [`Credential`] — everything except
/// `access_token`/`refresh_token`/`metadata`. What `load()` returns to
/// callers that only need to know a connection exists and when it expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub app: App,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialSummary {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Token set as returned by an OAuth handshake or a refresh call.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}
