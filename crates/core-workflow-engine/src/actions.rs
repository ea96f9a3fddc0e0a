//! Action execution (§4.10) — a flat match over the closed `action_id` set.
//! Configuration-level failures return `ActionStatus::Failed` synchronously
//! (no retry); transport/provider failures propagate as `Err` so the queue
//! retries.

use std::collections::HashMap;

use core_integrations::Dispatcher;
use core_models::{ActionStep, User};

use crate::error::WorkflowEngineError;
use crate::template::substitute;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub detail: String,
}

impl ActionResult {
    fn success(detail: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Success,
            detail: detail.into(),
        }
    }

    fn failed(detail: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Failed,
            detail: detail.into(),
        }
    }
}

fn cfg_str<'a>(config: &'a HashMap<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    config.get(key)?.as_str()
}

fn cfg_str_any<'a>(config: &'a HashMap<String, serde_json::Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| cfg_str(config, k))
}

fn sub(value: &str, trigger_data: &serde_json::Value) -> String {
    substitute(value, trigger_data)
}

pub async fn execute(
    dispatcher: &Dispatcher,
    user: &User,
    action: &ActionStep,
    trigger_data: &serde_json::Value,
) -> Result<ActionResult, WorkflowEngineError> {
    let config = &action.config;

    match action.effective_action_id() {
        "send_channel_message" => {
            let Some(channel) = cfg_str(config, "channel") else {
                return Ok(ActionResult::failed("missing required config: channel"));
            };
            let Some(message) = cfg_str_any(config, &["message", "text", "description"]) else {
                return Ok(ActionResult::failed("missing required config: message"));
            };
            let text = sub(message, trigger_data);
            dispatcher.slack_send_channel_message(user, channel, &text).await?;
            Ok(ActionResult::success(format!("posted to {channel}")))
        }

        "send_dm" => {
            let text = match cfg_str_any(config, &["text", "message"]) {
                Some(t) => sub(t, trigger_data),
                None => return Ok(ActionResult::failed("missing required config: text")),
            };
            let target = match cfg_str_any(config, &["userId", "user_id"]) {
                Some(id) => id.to_string(),
                None => {
                    let metadata = dispatcher
                        .credential_metadata(user, core_models::App::Slack)
                        .await?;
                    match metadata.get("installing_user_id").and_then(|v| v.as_str()) {
                        Some(id) => id.to_string(),
                        None => return Ok(ActionResult::failed("no target user for send_dm")),
                    }
                }
            };
            dispatcher.slack_send_dm(user, &target, &text).await?;
            Ok(ActionResult::success(format!("dm sent to {target}")))
        }

        "update_message" => {
            let (Some(channel), Some(ts), Some(text)) = (
                cfg_str(config, "channel"),
                cfg_str(config, "messageTs"),
                cfg_str(config, "text"),
            ) else {
                return Ok(ActionResult::failed(
                    "missing required config: channel, messageTs, text",
                ));
            };
            dispatcher.slack_update_message(user, channel, ts, text).await?;
            Ok(ActionResult::success("message updated"))
        }

        "add_reaction" => {
            let (Some(channel), Some(ts), Some(reaction)) = (
                cfg_str(config, "channel"),
                cfg_str(config, "messageTs"),
                cfg_str(config, "reactionName"),
            ) else {
                return Ok(ActionResult::failed(
                    "missing required config: channel, messageTs, reactionName",
                ));
            };
            dispatcher.slack_add_reaction(user, channel, ts, reaction).await?;
            Ok(ActionResult::success(format!("reacted with {reaction}")))
        }

        "send_email" => {
            let Some(to) = cfg_str(config, "to") else {
                return Ok(ActionResult::failed("missing required config: to"));
            };
            let subject = cfg_str(config, "subject").map(|s| sub(s, trigger_data)).unwrap_or_default();
            let body = cfg_str(config, "body").map(|s| sub(s, trigger_data)).unwrap_or_default();
            dispatcher.gmail_send_email(user, to, &subject, &body).await?;
            Ok(ActionResult::success(format!("email sent to {to}")))
        }

        "reply_to_email" => {
            let (Some(message_id), Some(thread_id)) =
                (cfg_str(config, "messageId"), cfg_str(config, "threadId"))
            else {
                return Ok(ActionResult::failed(
                    "missing required config: messageId, threadId",
                ));
            };
            let body = cfg_str(config, "body").map(|s| sub(s, trigger_data)).unwrap_or_default();
            let subject = cfg_str(config, "subject").map(|s| sub(s, trigger_data)).unwrap_or_default();
            let message_id = sub(message_id, trigger_data);
            let thread_id = sub(thread_id, trigger_data);
            // `to` is intentionally left to the provider: Gmail preserves
            // the thread's recipients when `In-Reply-To`/`References` are set.
            dispatcher
                .gmail_reply_to_email(user, &message_id, &thread_id, "", &subject, &body)
                .await?;
            Ok(ActionResult::success("reply sent"))
        }

        "add_label_to_email" => {
            let Some(message_id) = cfg_str(config, "messageId") else {
                return Ok(ActionResult::failed("missing required config: messageId"));
            };
            let Some(label_ids) = config.get("labelIds").and_then(|v| v.as_array()) else {
                return Ok(ActionResult::failed("missing required config: labelIds"));
            };
            let message_id = sub(message_id, trigger_data);
            let labels: Vec<String> = label_ids
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect();
            dispatcher.gmail_add_label(user, &message_id, &labels).await?;
            Ok(ActionResult::success("label added"))
        }

        "star_email" => {
            let Some(message_id) = cfg_str(config, "messageId") else {
                return Ok(ActionResult::failed("missing required config: messageId"));
            };
            let message_id = sub(message_id, trigger_data);
            dispatcher.gmail_star_email(user, &message_id).await?;
            Ok(ActionResult::success("starred"))
        }

        "create_issue" => {
            let (Some(owner), Some(repo)) = (cfg_str(config, "owner"), cfg_str(config, "repo")) else {
                return Ok(ActionResult::failed("missing required config: owner, repo"));
            };
            let title = cfg_str(config, "title").map(|s| sub(s, trigger_data)).unwrap_or_default();
            let body = cfg_str(config, "body").map(|s| sub(s, trigger_data)).unwrap_or_default();
            dispatcher.github_create_issue(user, owner, repo, &title, &body).await?;
            Ok(ActionResult::success(format!("issue created in {owner}/{repo}")))
        }

        "add_comment_to_issue" => {
            let (Some(owner), Some(repo), Some(issue_number)) = (
                cfg_str(config, "owner"),
                cfg_str(config, "repo"),
                cfg_str(config, "issue_number"),
            ) else {
                return Ok(ActionResult::failed(
                    "missing required config: owner, repo, issue_number",
                ));
            };
            let comment = cfg_str(config, "comment").map(|s| sub(s, trigger_data)).unwrap_or_default();
            dispatcher
                .github_add_comment_to_issue(user, owner, repo, issue_number, &comment)
                .await?;
            Ok(ActionResult::success("comment added"))
        }

        "close_issue" => {
            let (Some(owner), Some(repo), Some(issue_number)) = (
                cfg_str(config, "owner"),
                cfg_str(config, "repo"),
                cfg_str(config, "issue_number"),
            ) else {
                return Ok(ActionResult::failed(
                    "missing required config: owner, repo, issue_number",
                ));
            };
            dispatcher.github_close_issue(user, owner, repo, issue_number).await?;
            Ok(ActionResult::success("issue closed"))
        }

        "assign_issue" => {
            let (Some(owner), Some(repo), Some(issue_number)) = (
                cfg_str(config, "owner"),
                cfg_str(config, "repo"),
                cfg_str(config, "issue_number"),
            ) else {
                return Ok(ActionResult::failed(
                    "missing required config: owner, repo, issue_number",
                ));
            };
            let Some(assignees) = config.get("assignees").and_then(|v| v.as_array()) else {
                return Ok(ActionResult::failed("missing required config: assignees"));
            };
            let assignees: Vec<String> = assignees.iter().filter_map(|v| v.as_str()).map(|s| s.to_string()).collect();
            dispatcher
                .github_assign_issue(user, owner, repo, issue_number, &assignees)
                .await?;
            Ok(ActionResult::success("assignees updated"))
        }

        "send_webhook" => {
            let Some(url) = cfg_str(config, "url") else {
                return Ok(ActionResult::failed("missing required config: url"));
            };
            let payload = match config.get("payload") {
                Some(serde_json::Value::String(s)) => {
                    let substituted = sub(s, trigger_data);
                    if url.contains("hooks.slack.com") {
                        serde_json::json!({ "text": substituted })
                    } else {
                        serde_json::Value::String(substituted)
                    }
                }
                Some(other) => other.clone(),
                None => serde_json::Value::Null,
            };
            dispatcher.send_webhook(url, payload).await.map_err(WorkflowEngineError::from)?;
            Ok(ActionResult::success(format!("webhook posted to {url}")))
        }

        other => Ok(ActionResult::failed(format!("unknown action_id: {other}"))),
    }
}
