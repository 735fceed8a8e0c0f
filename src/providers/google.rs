//! Google Calendar as the replica target.

use async_trait::async_trait;
use calrelay_core::replica::{ReplicaTarget, ReplicationFailure, ReplicationOutcome};
use calrelay_core::{Event, RelayError, RelayResult};
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::{info, warn};

use super::{request_error, status_error};

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google's alias for the user's main calendar
pub const DEFAULT_CALENDAR_ID: &str = "primary";

pub struct GoogleReplica {
    client: Client,
    base_url: String,
    access_token: String,
    calendar_id: String,
}

#[derive(Debug, Serialize)]
struct GoogleEvent {
    summary: String,
    start: GoogleDateTime,
    end: GoogleDateTime,
}

#[derive(Debug, Serialize)]
struct GoogleDateTime {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: &'static str,
}

impl From<&Event> for GoogleEvent {
    fn from(event: &Event) -> Self {
        GoogleEvent {
            summary: event.replica_summary(),
            start: GoogleDateTime {
                date_time: event.start.to_rfc3339(),
                time_zone: "UTC",
            },
            end: GoogleDateTime {
                date_time: event.end.to_rfc3339(),
                time_zone: "UTC",
            },
        }
    }
}

impl GoogleReplica {
    pub fn new(client: Client, access_token: String, calendar_id: impl Into<String>) -> Self {
        GoogleReplica {
            client,
            base_url: CALENDAR_API_BASE.to_string(),
            access_token,
            calendar_id: calendar_id.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn events_url(&self) -> RelayResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RelayError::Config(format!("Invalid Google API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| RelayError::Config("Google API URL cannot take a path".into()))?
            .pop_if_empty()
            .extend(["calendars", self.calendar_id.as_str(), "events"]);
        Ok(url)
    }

    async fn insert(&self, url: &Url, event: &Event) -> RelayResult<()> {
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.access_token)
            .json(&GoogleEvent::from(event))
            .send()
            .await
            .map_err(|e| request_error(e, RelayError::Replica, "Google Calendar"))?;

        if !response.status().is_success() {
            return Err(status_error(response, RelayError::Replica, "Google Calendar").await);
        }
        Ok(())
    }
}

#[async_trait]
impl ReplicaTarget for GoogleReplica {
    async fn add_events(&self, events: &[Event]) -> RelayResult<ReplicationOutcome> {
        let url = self.events_url()?;
        let mut failures = Vec::new();

        for event in events {
            info!(id = %event.id, subject = %event.subject, "adding event to replica calendar");
            if let Err(error) = self.insert(&url, event).await {
                warn!(id = %event.id, error = %error, "failed to add event");
                failures.push(ReplicationFailure {
                    event: event.clone(),
                    error,
                });
            }
        }

        Ok(ReplicationOutcome::from_failures(failures))
    }
}
