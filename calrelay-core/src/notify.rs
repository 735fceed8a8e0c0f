//! Notification channel boundary.

use async_trait::async_trait;

use crate::error::RelayResult;

/// Delivers a text message to a human-facing channel.
///
/// Fire-and-report: implementations do not retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> RelayResult<()>;
}
