//! GitHub detectors: `new_issue`, `pull_request_opened`, `issue_commented`,
//! `commit_pushed` (§4.4).

use std::collections::HashMap;

use core_integrations::{Dispatcher, IntegrationError};
use core_models::User;

use crate::candidate::{optional_str, required_str, sort_newest_first, TriggerCandidate};

fn to_candidates(items: Vec<core_integrations::adapters::github::GithubItem>) -> Vec<TriggerCandidate> {
    let mut candidates: Vec<TriggerCandidate> = items
        .into_iter()
        .map(|item| TriggerCandidate {
            external_id: item.external_id,
            occurred_at: item.occurred_at,
            data: serde_json::json!({ "trigger": item.data }),
        })
        .collect();
    sort_newest_first(&mut candidates);
    candidates
}

pub async fn new_issue(
    dispatcher: &Dispatcher,
    user: &User,
    config: &HashMap<String, serde_json::Value>,
) -> Result<Vec<TriggerCandidate>, IntegrationError> {
    let (Some(owner), Some(repo)) = (required_str(config, "owner"), required_str(config, "repo")) else {
        return Ok(vec![]);
    };
    let items = dispatcher.github_list_issues(user, owner, repo).await?;
    // GitHub's issues endpoint also returns PRs (core_integrations::adapters::github
    // documents this); a PR item carries a non-null `pull_request` field.
    let items: Vec<_> = items
        .into_iter()
        .filter(|item| !item.data.get("pull_request").is_some_and(|v| !v.is_null()))
        .collect();
    Ok(to_candidates(items))
}

pub async fn pull_request_opened(
    dispatcher: &Dispatcher,
    user: &User,
    config: &HashMap<String, serde_json::Value>,
) -> Result<Vec<TriggerCandidate>, IntegrationError> {
    let (Some(owner), Some(repo)) = (required_str(config, "owner"), required_str(config, "repo")) else {
        return Ok(vec![]);
    };
    let items = dispatcher.github_list_pull_requests(user, owner, repo).await?;
    Ok(to_candidates(items))
}

pub async fn issue_commented(
    dispatcher: &Dispatcher,
    user: &User,
    config: &HashMap<String, serde_json::Value>,
) -> Result<Vec<TriggerCandidate>, IntegrationError> {
    let (Some(owner), Some(repo)) = (required_str(config, "owner"), required_str(config, "repo")) else {
        return Ok(vec![]);
    };
    let items = dispatcher.github_list_issue_comments(user, owner, repo).await?;
    Ok(to_candidates(items))
}

pub async fn commit_pushed(
    dispatcher: &Dispatcher,
    user: &User,
    config: &HashMap<String, serde_json::Value>,
) -> Result<Vec<TriggerCandidate>, IntegrationError> {
    let (Some(owner), Some(repo)) = (required_str(config, "owner"), required_str(config, "repo")) else {
        return Ok(vec![]);
    };
    let branch = optional_str(config, "branch");
    let items = dispatcher.github_list_commits(user, owner, repo, branch).await?;
    Ok(to_candidates(items))
}
