//! Outbound notification channel (§6) — deliberately a trait, not a
//! concrete SMTP client, since the real email channel is out of scope here.

use async_trait::async_trait;
use core_models::User;
use tracing::warn;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user: &User, subject: &str, body: &str);
}

/// Stand-in used in place of a real email client: logs instead of sending.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, user: &User, subject: &str, body: &str) {
        warn!(user_id = %user.id, email = %user.email, subject, body, "notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracing_notifier_does_not_panic() {
        let user = User::new("a@b.com", "A");
        TracingNotifier.notify(&user, "subject", "body").await;
    }
}
