//! GitHub REST v3 adapter (§4.2). Stateless: every call takes the bearer
//! token as an argument.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::IntegrationError;

const BASE_URL: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct GithubItem {
    /// Numeric id/number or sha, stringified — the stable external id.
    pub external_id: String,
    pub data: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

pub struct GithubAdapter;

impl GithubAdapter {
    async fn get_json<T: for<'de> Deserialize<'de>>(
        client: &Client,
        token: &str,
        url: &str,
    ) -> Result<T, IntegrationError> {
        let resp = client
            .get(url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "workflow-engine")
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
        Ok(resp.json().await?)
    }

    async fn send_json(
        client: &Client,
        token: &str,
        method: reqwest::Method,
        url: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, IntegrationError> {
        let resp = client
            .request(method, url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "workflow-engine")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(IntegrationError::from_status(resp.status(), None));
        }
        Ok(resp.json().await.unwrap_or(serde_json::Value::Null))
    }

    pub async fn list_repos(client: &Client, token: &str) -> Result<serde_json::Value, IntegrationError> {
        Self::get_json(client, token, &format!("{BASE_URL}/user/repos")).await
    }

    pub async fn get_current_user(client: &Client, token: &str) -> Result<serde_json::Value, IntegrationError> {
        Self::get_json(client, token, &format!("{BASE_URL}/user")).await
    }

    pub async fn list_issues(
        client: &Client,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<GithubItem>, IntegrationError> {
        let items: Vec<serde_json::Value> = Self::get_json(
            client,
            token,
            &format!("{BASE_URL}/repos/{owner}/{repo}/issues?state=open"),
        )
        .await?;
        Ok(items
            .into_iter()
            // GitHub's issues endpoint also returns PRs; callers that want
            // only issues filter those out themselves via `pull_request`.
            .map(|v| to_numbered_item(v, "number"))
            .collect())
    }

    pub async fn list_pull_requests(
        client: &Client,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<GithubItem>, IntegrationError> {
        let items: Vec<serde_json::Value> = Self::get_json(
            client,
            token,
            &format!("{BASE_URL}/repos/{owner}/{repo}/pulls?state=open"),
        )
        .await?;
        Ok(items.into_iter().map(|v| to_numbered_item(v, "number")).collect())
    }

    pub async fn list_issue_comments(
        client: &Client,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<GithubItem>, IntegrationError> {
        let items: Vec<serde_json::Value> = Self::get_json(
            client,
            token,
            &format!("{BASE_URL}/repos/{owner}/{repo}/issues/comments"),
        )
        .await?;
        Ok(items.into_iter().map(|v| to_numbered_item(v, "id")).collect())
    }

    pub async fn list_commits(
        client: &Client,
        token: &str,
        owner: &str,
        repo: &str,
        branch: Option<&str>,
    ) -> Result<Vec<GithubItem>, IntegrationError> {
        let mut url = format!("{BASE_URL}/repos/{owner}/{repo}/commits");
        if let Some(branch) = branch {
            url.push_str(&format!("?sha={branch}"));
        }
        let items: Vec<serde_json::Value> = Self::get_json(client, token, &url).await?;
        Ok(items
            .into_iter()
            .map(|v| {
                let sha = v.get("sha").and_then(|s| s.as_str()).unwrap_or_default().to_string();
                let occurred_at = v
                    .get("commit")
                    .and_then(|c| c.get("author"))
                    .and_then(|a| a.get("date"))
                    .and_then(|d| d.as_str())
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(Utc::now);
                GithubItem {
                    external_id: sha,
                    data: v,
                    occurred_at,
                }
            })
            .collect())
    }

    pub async fn create_issue(
        client: &Client,
        token: &str,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<(), IntegrationError> {
        Self::send_json(
            client,
            token,
            reqwest::Method::POST,
            &format!("{BASE_URL}/repos/{owner}/{repo}/issues"),
            serde_json::json!({ "title": title, "body": body }),
        )
        .await?;
        Ok(())
    }

    pub async fn add_comment_to_issue(
        client: &Client,
        token: &str,
        owner: &str,
        repo: &str,
        issue_number: &str,
        comment: &str,
    ) -> Result<(), IntegrationError> {
        Self::send_json(
            client,
            token,
            reqwest::Method::POST,
            &format!("{BASE_URL}/repos/{owner}/{repo}/issues/{issue_number}/comments"),
            serde_json::json!({ "body": comment }),
        )
        .await?;
        Ok(())
    }

    pub async fn close_issue(
        client: &Client,
        token: &str,
        owner: &str,
        repo: &str,
        issue_number: &str,
    ) -> Result<(), IntegrationError> {
        Self::send_json(
            client,
            token,
            reqwest::Method::PATCH,
            &format!("{BASE_URL}/repos/{owner}/{repo}/issues/{issue_number}"),
            serde_json::json!({ "state": "closed" }),
        )
        .await?;
        Ok(())
    }

    pub async fn assign_issue(
        client: &Client,
        token: &str,
        owner: &str,
        repo: &str,
        issue_number: &str,
        assignees: &[String],
    ) -> Result<(), IntegrationError> {
        Self::send_json(
            client,
            token,
            reqwest::Method::POST,
            &format!("{BASE_URL}/repos/{owner}/{repo}/issues/{issue_number}/assignees"),
            serde_json::json!({ "assignees": assignees }),
        )
        .await?;
        Ok(())
    }
}

fn to_numbered_item(value: serde_json::Value, id_field: &str) -> GithubItem {
    let external_id = match value.get(id_field) {
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        _ => String::new(),
    };
    let occurred_at = value
        .get("created_at")
        .and_then(|d| d.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    GithubItem {
        external_id,
        data: value,
        occurred_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_as_string_external_id() {
        let item = to_numbered_item(
            serde_json::json!({ "number": 42, "created_at": "2024-01-01T00:00:00Z" }),
            "number",
        );
        assert_eq!(item.external_id, "42");
    }
}
