//! Integration Dispatcher (C3) — §4.3's 5-step contract: load credential,
//! refresh if expired, serve cacheable reads from the TTL cache, route to
//! the adapter, and cache the result when applicable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use core_credentials::CredentialStore;
use core_models::{App, Credential, TokenSet, User};
use core_notify::Notifier;
use reqwest::Client;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::{github::GithubAdapter, gmail::GmailAdapter, slack::SlackAdapter, webhook::WebhookAdapter};
use crate::cache::TtlCache;
use crate::error::IntegrationError;

/// Client id/secret/token-endpoint triple for one app's OAuth refresh flow.
#[derive(Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_endpoint: String,
}

pub struct Dispatcher {
    credentials: Arc<CredentialStore>,
    client: Client,
    cache: TtlCache,
    notifier: Arc<dyn Notifier>,
    oauth_configs: HashMap<App, OAuthClientConfig>,
    webhook_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        credentials: Arc<CredentialStore>,
        notifier: Arc<dyn Notifier>,
        oauth_configs: HashMap<App, OAuthClientConfig>,
        webhook_timeout: Duration,
    ) -> Self {
        Self {
            credentials,
            client: Client::new(),
            cache: TtlCache::new(),
            notifier,
            oauth_configs,
            webhook_timeout,
        }
    }

    /// Steps 1–2 of §4.3: load the credential, refreshing the access
    /// token in place if `expires_at` is past.
    async fn ensure_token(&self, user: &User, app: App) -> Result<String, IntegrationError> {
        let credential = self
            .credentials
            .load_secrets(user.id, app)
            .await?
            .ok_or(IntegrationError::NotConnected)?;

        if !credential.is_expired(Utc::now()) {
            return Ok(credential.access_token);
        }

        match self.refresh(&credential, app).await {
            Ok(tokens) => {
                let access_token = tokens.access_token.clone();
                self.credentials.update_tokens(user.id, app, tokens).await?;
                info!(user_id = %user.id, app = app.as_str(), "token_refreshed");
                Ok(access_token)
            }
            Err(e) => {
                warn!(user_id = %user.id, app = app.as_str(), error = %e, "token refresh failed");
                self.notifier
                    .notify(
                        user,
                        "Reconnect required",
                        &format!("Your {} connection needs to be reconnected.", app.as_str()),
                    )
                    .await;
                Err(IntegrationError::ReauthRequired)
            }
        }
    }

    async fn refresh(&self, credential: &Credential, app: App) -> Result<TokenSet, IntegrationError> {
        let refresh_token = credential
            .refresh_token
            .as_ref()
            .ok_or_else(|| IntegrationError::Internal("no refresh token stored".into()))?;
        let oauth = self
            .oauth_configs
            .get(&app)
            .ok_or_else(|| IntegrationError::Internal(format!("no oauth config for {}", app.as_str())))?;

        #[derive(serde::Deserialize)]
        struct RefreshResponse {
            access_token: String,
            #[serde(default)]
            refresh_token: Option<String>,
            #[serde(default)]
            expires_in: Option<i64>,
        }

        let resp = self
            .client
            .post(&oauth.token_endpoint)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", oauth.client_id.as_str()),
                ("client_secret", oauth.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(IntegrationError::from_status(resp.status(), None));
        }

        let parsed: RefreshResponse = resp.json().await?;
        let expires_at = parsed.expires_in.map(|secs| Utc::now() + chrono::Duration::seconds(secs));

        Ok(TokenSet {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token.or_else(|| credential.refresh_token.clone()),
            expires_at,
            metadata: credential.metadata.clone(),
        })
    }

    async fn cached_or<F, Fut>(
        &self,
        app: &'static str,
        user_id: Uuid,
        method: &'static str,
        ttl: Duration,
        fetch: F,
    ) -> Result<serde_json::Value, IntegrationError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<serde_json::Value, IntegrationError>>,
    {
        if let Some(hit) = self.cache.get(app, user_id, method) {
            return Ok(hit);
        }
        let value = fetch().await?;
        self.cache.set(app, user_id, method, value.clone(), ttl);
        Ok(value)
    }

    /// Raw credential metadata (e.g. the installing Slack user id), for
    /// actions that fall back to it when config omits an explicit target.
    pub async fn credential_metadata(&self, user: &User, app: App) -> Result<serde_json::Value, IntegrationError> {
        let credential = self
            .credentials
            .load_secrets(user.id, app)
            .await?
            .ok_or(IntegrationError::NotConnected)?;
        Ok(credential.metadata)
    }

    // ---- Gmail ----------------------------------------------------------

    pub async fn gmail_list_labels(&self, user: &User) -> Result<serde_json::Value, IntegrationError> {
        let token = self.ensure_token(user, App::Gmail).await?;
        self.cached_or("gmail", user.id, "listLabels", Duration::from_secs(300), || {
            GmailAdapter::list_labels(&self.client, &token)
        })
        .await
    }

    pub async fn gmail_get_profile(&self, user: &User) -> Result<serde_json::Value, IntegrationError> {
        let token = self.ensure_token(user, App::Gmail).await?;
        self.cached_or("gmail", user.id, "getProfile", Duration::from_secs(600), || {
            GmailAdapter::get_profile(&self.client, &token)
        })
        .await
    }

    pub async fn gmail_list_messages(
        &self,
        user: &User,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, IntegrationError> {
        let token = self.ensure_token(user, App::Gmail).await?;
        GmailAdapter::list_messages(&self.client, &token, query, max_results).await
    }

    pub async fn gmail_get_messages(
        &self,
        user: &User,
        ids: &[String],
    ) -> Result<Vec<crate::adapters::gmail::GmailMessage>, IntegrationError> {
        let token = self.ensure_token(user, App::Gmail).await?;
        GmailAdapter::get_messages(&self.client, &token, ids).await
    }

    pub async fn gmail_send_email(
        &self,
        user: &User,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), IntegrationError> {
        let token = self.ensure_token(user, App::Gmail).await?;
        GmailAdapter::send_email(&self.client, &token, to, subject, body).await
    }

    pub async fn gmail_reply_to_email(
        &self,
        user: &User,
        message_id: &str,
        thread_id: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), IntegrationError> {
        let token = self.ensure_token(user, App::Gmail).await?;
        GmailAdapter::reply_to_email(&self.client, &token, message_id, thread_id, to, subject, body).await
    }

    pub async fn gmail_add_label(
        &self,
        user: &User,
        message_id: &str,
        label_ids: &[String],
    ) -> Result<(), IntegrationError> {
        let token = self.ensure_token(user, App::Gmail).await?;
        GmailAdapter::add_label_to_email(&self.client, &token, message_id, label_ids).await
    }

    pub async fn gmail_star_email(&self, user: &User, message_id: &str) -> Result<(), IntegrationError> {
        let token = self.ensure_token(user, App::Gmail).await?;
        GmailAdapter::star_email(&self.client, &token, message_id).await
    }

    // ---- Slack ------------------------------------------------------------

    pub async fn slack_list_channels(&self, user: &User) -> Result<serde_json::Value, IntegrationError> {
        let token = self.ensure_token(user, App::Slack).await?;
        self.cached_or("slack", user.id, "listChannels", Duration::from_secs(300), || {
            SlackAdapter::list_channels(&self.client, &token)
        })
        .await
    }

    pub async fn slack_list_users(&self, user: &User) -> Result<serde_json::Value, IntegrationError> {
        let token = self.ensure_token(user, App::Slack).await?;
        self.cached_or("slack", user.id, "listUsers", Duration::from_secs(300), || {
            SlackAdapter::list_users(&self.client, &token)
        })
        .await
    }

    pub async fn slack_get_workspace_info(&self, user: &User) -> Result<serde_json::Value, IntegrationError> {
        let token = self.ensure_token(user, App::Slack).await?;
        self.cached_or("slack", user.id, "getWorkspaceInfo", Duration::from_secs(600), || {
            SlackAdapter::get_workspace_info(&self.client, &token)
        })
        .await
    }

    pub async fn slack_get_current_user(&self, user: &User) -> Result<serde_json::Value, IntegrationError> {
        let token = self.ensure_token(user, App::Slack).await?;
        self.cached_or("slack", user.id, "getCurrentUser", Duration::from_secs(600), || {
            SlackAdapter::get_current_user(&self.client, &token)
        })
        .await
    }

    pub async fn slack_fetch_channel_history(
        &self,
        user: &User,
        channel: &str,
        limit: usize,
    ) -> Result<Vec<crate::adapters::slack::SlackMessage>, IntegrationError> {
        let token = self.ensure_token(user, App::Slack).await?;
        SlackAdapter::fetch_channel_history(&self.client, &token, channel, limit).await
    }

    pub async fn slack_send_channel_message(
        &self,
        user: &User,
        channel: &str,
        text: &str,
    ) -> Result<(), IntegrationError> {
        let token = self.ensure_token(user, App::Slack).await?;
        SlackAdapter::send_channel_message(&self.client, &token, channel, text).await
    }

    pub async fn slack_send_dm(&self, user: &User, target_user_id: &str, text: &str) -> Result<(), IntegrationError> {
        let token = self.ensure_token(user, App::Slack).await?;
        SlackAdapter::send_dm(&self.client, &token, target_user_id, text).await
    }

    pub async fn slack_update_message(
        &self,
        user: &User,
        channel: &str,
        message_ts: &str,
        text: &str,
    ) -> Result<(), IntegrationError> {
        let token = self.ensure_token(user, App::Slack).await?;
        SlackAdapter::update_message(&self.client, &token, channel, message_ts, text).await
    }

    pub async fn slack_add_reaction(
        &self,
        user: &User,
        channel: &str,
        message_ts: &str,
        reaction_name: &str,
    ) -> Result<(), IntegrationError> {
        let token = self.ensure_token(user, App::Slack).await?;
        SlackAdapter::add_reaction(&self.client, &token, channel, message_ts, reaction_name).await
    }

    // ---- GitHub -----------------------------------------------------------

    pub async fn github_list_repos(&self, user: &User) -> Result<serde_json::Value, IntegrationError> {
        let token = self.ensure_token(user, App::Github).await?;
        self.cached_or("github", user.id, "listRepos", Duration::from_secs(300), || {
            GithubAdapter::list_repos(&self.client, &token)
        })
        .await
    }

    pub async fn github_get_current_user(&self, user: &User) -> Result<serde_json::Value, IntegrationError> {
        let token = self.ensure_token(user, App::Github).await?;
        self.cached_or("github", user.id, "getCurrentUser", Duration::from_secs(600), || {
            GithubAdapter::get_current_user(&self.client, &token)
        })
        .await
    }

    pub async fn github_list_issues(
        &self,
        user: &User,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<crate::adapters::github::GithubItem>, IntegrationError> {
        let token = self.ensure_token(user, App::Github).await?;
        GithubAdapter::list_issues(&self.client, &token, owner, repo).await
    }

    pub async fn github_list_pull_requests(
        &self,
        user: &User,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<crate::adapters::github::GithubItem>, IntegrationError> {
        let token = self.ensure_token(user, App::Github).await?;
        GithubAdapter::list_pull_requests(&self.client, &token, owner, repo).await
    }

    pub async fn github_list_issue_comments(
        &self,
        user: &User,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<crate::adapters::github::GithubItem>, IntegrationError> {
        let token = self.ensure_token(user, App::Github).await?;
        GithubAdapter::list_issue_comments(&self.client, &token, owner, repo).await
    }

    pub async fn github_list_commits(
        &self,
        user: &User,
        owner: &str,
        repo: &str,
        branch: Option<&str>,
    ) -> Result<Vec<crate::adapters::github::GithubItem>, IntegrationError> {
        let token = self.ensure_token(user, App::Github).await?;
        GithubAdapter::list_commits(&self.client, &token, owner, repo, branch).await
    }

    pub async fn github_create_issue(
        &self,
        user: &User,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<(), IntegrationError> {
        let token = self.ensure_token(user, App::Github).await?;
        GithubAdapter::create_issue(&self.client, &token, owner, repo, title, body).await
    }

    pub async fn github_add_comment_to_issue(
        &self,
        user: &User,
        owner: &str,
        repo: &str,
        issue_number: &str,
        comment: &str,
    ) -> Result<(), IntegrationError> {
        let token = self.ensure_token(user, App::Github).await?;
        GithubAdapter::add_comment_to_issue(&self.client, &token, owner, repo, issue_number, comment).await
    }

    pub async fn github_close_issue(
        &self,
        user: &User,
        owner: &str,
        repo: &str,
        issue_number: &str,
    ) -> Result<(), IntegrationError> {
        let token = self.ensure_token(user, App::Github).await?;
        GithubAdapter::close_issue(&self.client, &token, owner, repo, issue_number).await
    }

    pub async fn github_assign_issue(
        &self,
        user: &User,
        owner: &str,
        repo: &str,
        issue_number: &str,
        assignees: &[String],
    ) -> Result<(), IntegrationError> {
        let token = self.ensure_token(user, App::Github).await?;
        GithubAdapter::assign_issue(&self.client, &token, owner, repo, issue_number, assignees).await
    }

    // ---- Webhook ------------------------------------------------------------

    /// Webhooks carry no stored credential — they are called with a bare URL.
    pub async fn send_webhook(&self, url: &str, payload: serde_json::Value) -> Result<(), IntegrationError> {
        WebhookAdapter::send(&self.client, url, payload, self.webhook_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_config_map_keys_by_app() {
        let mut configs = HashMap::new();
        configs.insert(
            App::Gmail,
            OAuthClientConfig {
                client_id: "id".into(),
                client_secret: "secret".into(),
                token_endpoint: "https://oauth2.googleapis.com/token".into(),
            },
        );
        assert!(configs.contains_key(&App::Gmail));
        assert!(!configs.contains_key(&App::Slack));
    }
}
