//! Gmail REST v1 adapter (§4.2). Stateless: every call takes the bearer
//! token as an argument.

use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::IntegrationError;

const BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";
/// Per-poll hydration cap regardless of how many ids the caller requests.
const DETAIL_FETCH_CAP: usize = 5;
const BODY_TRUNCATE_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct GmailMessage {
    pub id: String,
    pub thread_id: String,
    pub from: String,
    pub subject: String,
    pub body: String,
    pub internal_date: DateTime<Utc>,
}

pub struct GmailAdapter;

impl GmailAdapter {
    async fn get_json<T: for<'de> Deserialize<'de>>(
        client: &Client,
        token: &str,
        url: &str,
    ) -> Result<T, IntegrationError> {
        let resp = client.get(url).bearer_auth(token).send().await?;
        if !resp.status().is_success() {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(IntegrationError::from_status(resp.status(), retry_after));
        }
        Ok(resp.json().await?)
    }

    /// Returns message ids matching `query`, capped at `max_results`.
    pub async fn list_messages(
        client: &Client,
        token: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, IntegrationError> {
        #[derive(Deserialize)]
        struct ListResponse {
            #[serde(default)]
            messages: Vec<MessageRef>,
        }
        #[derive(Deserialize)]
        struct MessageRef {
            id: String,
        }

        let url = format!(
            "{BASE_URL}/users/me/messages?q={}&maxResults={max_results}",
            urlencoding_simple(query)
        );
        let parsed: ListResponse = Self::get_json(client, token, &url).await?;
        Ok(parsed.messages.into_iter().map(|m| m.id).collect())
    }

    /// Fetch and normalize up to `DETAIL_FETCH_CAP` message ids.
    pub async fn get_messages(
        client: &Client,
        token: &str,
        ids: &[String],
    ) -> Result<Vec<GmailMessage>, IntegrationError> {
        let mut out = Vec::new();
        for id in ids.iter().take(DETAIL_FETCH_CAP) {
            out.push(Self::get_message(client, token, id).await?);
        }
        Ok(out)
    }

    pub async fn get_message(
        client: &Client,
        token: &str,
        id: &str,
    ) -> Result<GmailMessage, IntegrationError> {
        let url = format!("{BASE_URL}/users/me/messages/{id}?format=full");
        let raw: RawMessage = Self::get_json(client, token, &url).await?;

        let header = |name: &str| -> String {
            raw.payload
                .headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.clone())
                .unwrap_or_default()
        };

        let body = extract_text_plain(&raw.payload).unwrap_or_default();
        let body: String = body.chars().take(BODY_TRUNCATE_CHARS).collect();

        let millis: i64 = raw.internal_date.parse().unwrap_or_default();
        let internal_date = Utc
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(Utc::now);

        Ok(GmailMessage {
            id: raw.id,
            thread_id: raw.thread_id,
            from: header("From"),
            subject: header("Subject"),
            body,
            internal_date,
        })
    }

    pub async fn list_labels(client: &Client, token: &str) -> Result<serde_json::Value, IntegrationError> {
        Self::get_json(client, token, &format!("{BASE_URL}/users/me/labels")).await
    }

    pub async fn get_profile(client: &Client, token: &str) -> Result<serde_json::Value, IntegrationError> {
        Self::get_json(client, token, &format!("{BASE_URL}/users/me/profile")).await
    }

    pub async fn send_email(
        client: &Client,
        token: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), IntegrationError> {
        let raw = build_raw_message(to, subject, body, None, None);
        Self::post_send(client, token, &raw).await
    }

    pub async fn reply_to_email(
        client: &Client,
        token: &str,
        message_id: &str,
        thread_id: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), IntegrationError> {
        let raw = build_raw_message(to, subject, body, Some(message_id), Some(thread_id));
        Self::post_send(client, token, &raw).await
    }

    async fn post_send(client: &Client, token: &str, raw_b64: &str) -> Result<(), IntegrationError> {
        let resp = client
            .post(format!("{BASE_URL}/users/me/messages/send"))
            .bearer_auth(token)
            .json(&serde_json::json!({ "raw": raw_b64 }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(IntegrationError::from_status(resp.status(), None));
        }
        Ok(())
    }

    pub async fn add_label_to_email(
        client: &Client,
        token: &str,
        message_id: &str,
        label_ids: &[String],
    ) -> Result<(), IntegrationError> {
        let resp = client
            .post(format!("{BASE_URL}/users/me/messages/{message_id}/modify"))
            .bearer_auth(token)
            .json(&serde_json::json!({ "addLabelIds": label_ids }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(IntegrationError::from_status(resp.status(), None));
        }
        Ok(())
    }

    pub async fn star_email(client: &Client, token: &str, message_id: &str) -> Result<(), IntegrationError> {
        Self::add_label_to_email(client, token, message_id, &["STARRED".to_string()]).await
    }
}

#[derive(Deserialize)]
struct RawMessage {
    id: String,
    #[serde(rename = "threadId")]
    thread_id: String,
    #[serde(rename = "internalDate")]
    internal_date: String,
    payload: RawPayload,
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(default)]
    headers: Vec<RawHeader>,
    #[serde(default)]
    body: Option<RawBody>,
    #[serde(default)]
    parts: Vec<RawPayload>,
    #[serde(rename = "mimeType", default)]
    mime_type: String,
}

#[derive(Deserialize)]
struct RawHeader {
    name: String,
    value: String,
}

#[derive(Deserialize)]
struct RawBody {
    #[serde(default)]
    data: Option<String>,
}

/// Depth-first search for the first `text/plain` part, preferred per §4.2.
fn extract_text_plain(payload: &RawPayload) -> Option<String> {
    if payload.mime_type == "text/plain" {
        if let Some(data) = payload.body.as_ref().and_then(|b| b.data.as_deref()) {
            return decode_base64url(data);
        }
    }
    for part in &payload.parts {
        if let Some(text) = extract_text_plain(part) {
            return Some(text);
        }
    }
    None
}

fn decode_base64url(data: &str) -> Option<String> {
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(data.trim_end_matches('='))
        .ok()?;
    String::from_utf8(decoded).ok()
}

fn build_raw_message(
    to: &str,
    subject: &str,
    body: &str,
    in_reply_to: Option<&str>,
    thread_id: Option<&str>,
) -> String {
    let mut msg = format!("To: {to}\r\nSubject: {subject}\r\n");
    if let Some(id) = in_reply_to {
        msg.push_str(&format!("In-Reply-To: {id}\r\nReferences: {id}\r\n"));
    }
    let _ = thread_id;
    msg.push_str(&format!("Content-Type: text/plain; charset=UTF-8\r\n\r\n{body}"));
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(msg.as_bytes())
}

fn urlencoding_simple(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_message_is_base64url_without_padding() {
        let raw = build_raw_message("a@b.com", "hi", "body", None, None);
        assert!(!raw.contains('='));
        assert!(!raw.contains('+'));
        assert!(!raw.contains('/'));
    }
}
