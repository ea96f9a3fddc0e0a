//! Gmail detectors: `new_email`, `email_starred` (§4.4).

use std::collections::HashMap;

use core_integrations::{Dispatcher, IntegrationError};
use core_models::User;

use crate::candidate::{sort_newest_first, TriggerCandidate};

const DEFAULT_QUERY: &str = "is:unread newer_than:2d";
const LIST_CAP: usize = 10;

pub async fn new_email(
    dispatcher: &Dispatcher,
    user: &User,
    config: &HashMap<String, serde_json::Value>,
) -> Result<Vec<TriggerCandidate>, IntegrationError> {
    let query = config
        .get("query")
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_QUERY);
    fetch(dispatcher, user, query).await
}

/// `email_starred` forces the query regardless of user-supplied config.
pub async fn email_starred(
    dispatcher: &Dispatcher,
    user: &User,
) -> Result<Vec<TriggerCandidate>, IntegrationError> {
    fetch(dispatcher, user, "is:starred").await
}

async fn fetch(
    dispatcher: &Dispatcher,
    user: &User,
    query: &str,
) -> Result<Vec<TriggerCandidate>, IntegrationError> {
    let ids = dispatcher.gmail_list_messages(user, query, LIST_CAP).await?;
    let messages = dispatcher.gmail_get_messages(user, &ids).await?;

    let mut candidates: Vec<TriggerCandidate> = messages
        .into_iter()
        .map(|m| TriggerCandidate {
            external_id: m.id.clone(),
            occurred_at: m.internal_date,
            data: serde_json::json!({
                "trigger": {
                    "id": m.id,
                    "thread_id": m.thread_id,
                    "from": m.from,
                    "subject": m.subject,
                    "body": m.body,
                }
            }),
        })
        .collect();

    sort_newest_first(&mut candidates);
    Ok(candidates)
}
