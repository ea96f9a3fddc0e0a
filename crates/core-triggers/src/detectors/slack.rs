//! Slack detector: `new_channel_message` (§4.4).

use std::collections::HashMap;

use core_integrations::{Dispatcher, IntegrationError};
use core_models::User;

use crate::candidate::{required_str, sort_newest_first, TriggerCandidate};

const LIMIT: usize = 10;

pub async fn new_channel_message(
    dispatcher: &Dispatcher,
    user: &User,
    config: &HashMap<String, serde_json::Value>,
) -> Result<Vec<TriggerCandidate>, IntegrationError> {
    let Some(channel) = required_str(config, "channel") else {
        return Ok(vec![]);
    };

    let messages = dispatcher.slack_fetch_channel_history(user, channel, LIMIT).await?;

    let mut candidates: Vec<TriggerCandidate> = messages
        .into_iter()
        .map(|m| TriggerCandidate {
            external_id: m.ts.clone(),
            occurred_at: m.occurred_at,
            data: serde_json::json!({
                "trigger": {
                    "ts": m.ts,
                    "channel": m.channel,
                    "user": m.user,
                    "text": m.text,
                }
            }),
        })
        .collect();

    sort_newest_first(&mut candidates);
    Ok(candidates)
}
