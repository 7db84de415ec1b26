//! Outbound user notifications
//!
//! Delivery is best effort. Callers log a failed notification and carry on;
//! it never fails the operation that triggered it.

use async_trait::async_trait;

use crate::models::User;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn user_registered(&self, user: &User) -> anyhow::Result<()>;
}

/// Writes notifications to the log instead of sending email
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn user_registered(&self, user: &User) -> anyhow::Result<()> {
        tracing::info!(
            user_id = %user.id,
            nickname = %user.nickname,
            "Welcome email queued"
        );
        Ok(())
    }
}
