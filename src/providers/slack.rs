//! Notifiers: a Slack incoming webhook, or the log when none is configured.

use async_trait::async_trait;
use calrelay_core::notify::Notifier;
use calrelay_core::{RelayError, RelayResult};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::info;

use super::request_error;

pub struct SlackNotifier {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct SlackMessage<'a> {
    text: &'a str,
}

impl SlackNotifier {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        SlackNotifier {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, message: &str) -> RelayResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&SlackMessage { text: message })
            .send()
            .await
            .map_err(|e| request_error(e, RelayError::Notify, "Slack"))?;

        if response.status() != StatusCode::OK {
            return Err(RelayError::Notify(format!(
                "Can't send message: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Writes messages to the log and always succeeds.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> RelayResult<()> {
        info!(target: "calrelay::notify", "{}", message);
        Ok(())
    }
}
