//! Generic outbound webhook adapter (§4.2, §4.10 `send_webhook`).

use std::time::Duration;

use reqwest::Client;

use crate::error::IntegrationError;

pub struct WebhookAdapter;

impl WebhookAdapter {
    pub async fn send(
        client: &Client,
        url: &str,
        payload: serde_json::Value,
        timeout: Duration,
    ) -> Result<(), IntegrationError> {
        let resp = client
            .post(url)
            .timeout(timeout)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(IntegrationError::from_status(resp.status(), None));
        }
        Ok(())
    }
}
