//! Slack Web API adapter (§4.2). Stateless: every call takes the bearer
//! token as an argument.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::IntegrationError;

const BASE_URL: &str = "https://slack.com/api";

#[derive(Debug, Clone)]
pub struct SlackMessage {
    /// Slack's own `ts` field, preserved verbatim as the stable external id.
    pub ts: String,
    pub channel: String,
    pub user: String,
    pub text: String,
    pub occurred_at: DateTime<Utc>,
}

pub struct SlackAdapter;

impl SlackAdapter {
    async fn call(
        client: &Client,
        token: &str,
        method: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, IntegrationError> {
        let resp = client
            .post(format!("{BASE_URL}/{method}"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(IntegrationError::from_status(resp.status(), retry_after));
        }

        let value: serde_json::Value = resp.json().await?;
        if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
            let err = value
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string();
            return Err(IntegrationError::ProviderError(err));
        }
        Ok(value)
    }

    /// Fetches recent messages in `channel`, newest-first per Slack's API
    /// default, converting Slack's epoch-fractional `ts` to ISO-8601.
    pub async fn fetch_channel_history(
        client: &Client,
        token: &str,
        channel: &str,
        limit: usize,
    ) -> Result<Vec<SlackMessage>, IntegrationError> {
        #[derive(Deserialize)]
        struct RawMessage {
            ts: String,
            #[serde(default)]
            user: String,
            #[serde(default)]
            text: String,
        }

        let value = Self::call(
            client,
            token,
            "conversations.history",
            serde_json::json!({ "channel": channel, "limit": limit }),
        )
        .await?;

        let raw_messages: Vec<RawMessage> = serde_json::from_value(
            value.get("messages").cloned().unwrap_or(serde_json::Value::Array(vec![])),
        )
        .map_err(|e| IntegrationError::ProviderError(e.to_string()))?;

        Ok(raw_messages
            .into_iter()
            .map(|m| SlackMessage {
                occurred_at: slack_ts_to_datetime(&m.ts),
                ts: m.ts,
                channel: channel.to_string(),
                user: m.user,
                text: m.text,
            })
            .collect())
    }

    pub async fn list_channels(client: &Client, token: &str) -> Result<serde_json::Value, IntegrationError> {
        Self::call(client, token, "conversations.list", serde_json::json!({})).await
    }

    pub async fn list_users(client: &Client, token: &str) -> Result<serde_json::Value, IntegrationError> {
        Self::call(client, token, "users.list", serde_json::json!({})).await
    }

    pub async fn get_workspace_info(client: &Client, token: &str) -> Result<serde_json::Value, IntegrationError> {
        Self::call(client, token, "team.info", serde_json::json!({})).await
    }

    pub async fn get_current_user(client: &Client, token: &str) -> Result<serde_json::Value, IntegrationError> {
        Self::call(client, token, "auth.test", serde_json::json!({})).await
    }

    pub async fn send_channel_message(
        client: &Client,
        token: &str,
        channel: &str,
        text: &str,
    ) -> Result<(), IntegrationError> {
        Self::call(
            client,
            token,
            "chat.postMessage",
            serde_json::json!({ "channel": channel, "text": text }),
        )
        .await?;
        Ok(())
    }

    pub async fn send_dm(client: &Client, token: &str, user_id: &str, text: &str) -> Result<(), IntegrationError> {
        // A Slack DM channel is just the user id as the channel argument
        // for `chat.postMessage`.
        Self::send_channel_message(client, token, user_id, text).await
    }

    pub async fn update_message(
        client: &Client,
        token: &str,
        channel: &str,
        message_ts: &str,
        text: &str,
    ) -> Result<(), IntegrationError> {
        Self::call(
            client,
            token,
            "chat.update",
            serde_json::json!({ "channel": channel, "ts": message_ts, "text": text }),
        )
        .await?;
        Ok(())
    }

    pub async fn add_reaction(
        client: &Client,
        token: &str,
        channel: &str,
        message_ts: &str,
        reaction_name: &str,
    ) -> Result<(), IntegrationError> {
        Self::call(
            client,
            token,
            "reactions.add",
            serde_json::json!({ "channel": channel, "timestamp": message_ts, "name": reaction_name }),
        )
        .await?;
        Ok(())
    }
}

fn slack_ts_to_datetime(ts: &str) -> DateTime<Utc> {
    let secs: f64 = ts.parse().unwrap_or(0.0);
    chrono::DateTime::from_timestamp(secs.trunc() as i64, (secs.fract() * 1e9) as u32)
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_slack_ts_to_datetime() {
        let dt = slack_ts_to_datetime("1609459200.000100");
        assert_eq!(dt.to_rfc3339().starts_with("2021-01-01"), true);
    }
}
