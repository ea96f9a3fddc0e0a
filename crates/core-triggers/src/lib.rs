//! Core Triggers - per-trigger-type candidate event detectors (C4).

pub mod candidate;
pub mod detectors;

pub use candidate::TriggerCandidate;

use core_integrations::{Dispatcher, IntegrationError};
use core_models::{TriggerStep, User};

/// Routes a trigger step to its detector by `trigger_id`. An unrecognized
/// `trigger_id` is treated the same as missing config: an empty list.
pub async fn detect(
    dispatcher: &Dispatcher,
    user: &User,
    trigger: &TriggerStep,
) -> Result<Vec<TriggerCandidate>, IntegrationError> {
    match trigger.trigger_id.as_str() {
        "new_email" => detectors::gmail::new_email(dispatcher, user, &trigger.config).await,
        "email_starred" => detectors::gmail::email_starred(dispatcher, user).await,
        "new_channel_message" => detectors::slack::new_channel_message(dispatcher, user, &trigger.config).await,
        "new_issue" => detectors::github::new_issue(dispatcher, user, &trigger.config).await,
        "pull_request_opened" => detectors::github::pull_request_opened(dispatcher, user, &trigger.config).await,
        "issue_commented" => detectors::github::issue_commented(dispatcher, user, &trigger.config).await,
        "commit_pushed" => detectors::github::commit_pushed(dispatcher, user, &trigger.config).await,
        _ => Ok(vec![]),
    }
}
