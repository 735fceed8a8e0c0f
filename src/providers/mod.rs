//! HTTP collaborators: the Outlook event source, the Google replica
//! target, and the Slack/log notifiers.

pub mod google;
pub mod outlook;
pub mod slack;

use std::time::Duration;

use anyhow::{Context, Result};
use calrelay_core::RelayError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared client; every request carries [`HTTP_TIMEOUT`].
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Map a transport error, keeping timeouts distinguishable.
fn request_error(e: reqwest::Error, wrap: fn(String) -> RelayError, what: &str) -> RelayError {
    if e.is_timeout() {
        RelayError::Timeout(HTTP_TIMEOUT.as_secs())
    } else {
        wrap(format!("{} request failed: {}", what, e))
    }
}

/// Non-2xx response into an error carrying status and body.
async fn status_error(
    response: reqwest::Response,
    wrap: fn(String) -> RelayError,
    what: &str,
) -> RelayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    wrap(format!("{} error ({}): {}", what, status, body))
}
