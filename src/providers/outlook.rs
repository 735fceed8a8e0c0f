//! Microsoft Graph calendar view as the event source.

use async_trait::async_trait;
use calrelay_core::source::EventSource;
use calrelay_core::time::normalize_zoned;
use calrelay_core::{Event, RelayError, RelayResult, TimeWindow};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{request_error, status_error};

const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";
const OUTLOOK_TIMEZONE_HEADER: &str = r#"outlook.timezone="UTC""#;
const SELECT_FIELDS: &str = "id,organizer,subject,start,end";

pub struct OutlookSource {
    client: Client,
    base_url: String,
    access_token: String,
    calendar_id: Option<String>,
}

impl OutlookSource {
    pub fn new(client: Client, access_token: String) -> Self {
        OutlookSource {
            client,
            base_url: GRAPH_API_BASE.to_string(),
            access_token,
            calendar_id: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Read a specific calendar instead of the user's default one.
    pub fn with_calendar_id(mut self, calendar_id: Option<String>) -> Self {
        self.calendar_id = calendar_id;
        self
    }

    fn calendar_view_url(&self) -> String {
        match &self.calendar_id {
            Some(id) => format!("{}/me/calendars/{}/calendarview", self.base_url, id),
            None => format!("{}/me/calendarview", self.base_url),
        }
    }
}

#[async_trait]
impl EventSource for OutlookSource {
    async fn fetch_events(&self, window: &TimeWindow) -> RelayResult<Vec<Event>> {
        let mut url = self.calendar_view_url();
        let mut query = Some([
            ("StartDateTime", window.start_rfc3339()),
            ("EndDateTime", window.end_rfc3339()),
            ("$select", SELECT_FIELDS.to_string()),
        ]);
        let mut events = Vec::new();

        loop {
            let mut request = self
                .client
                .get(&url)
                .bearer_auth(&self.access_token)
                .header("Prefer", OUTLOOK_TIMEZONE_HEADER);
            // nextLink already carries the query
            if let Some(q) = query.take() {
                request = request.query(&q);
            }

            let response = request
                .send()
                .await
                .map_err(|e| request_error(e, RelayError::Source, "Graph"))?;

            if !response.status().is_success() {
                return Err(status_error(response, RelayError::Source, "Graph").await);
            }

            let page: CalendarViewResponse = response.json().await.map_err(|e| {
                RelayError::Source(format!("Failed to parse Graph response: {}", e))
            })?;

            debug!(count = page.value.len(), "fetched calendar view page");
            for raw in page.value {
                events.push(raw.into_event()?);
            }

            match page.next_link {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(events)
    }
}

#[derive(Debug, Deserialize)]
struct CalendarViewResponse {
    value: Vec<GraphEvent>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphEvent {
    id: String,
    subject: Option<String>,
    start: GraphDateTime,
    end: GraphDateTime,
    organizer: Option<GraphOrganizer>,
}

#[derive(Debug, Deserialize)]
struct GraphDateTime {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphOrganizer {
    #[serde(rename = "emailAddress")]
    email_address: GraphEmailAddress,
}

#[derive(Debug, Deserialize)]
struct GraphEmailAddress {
    name: Option<String>,
    address: Option<String>,
}

impl GraphEvent {
    fn into_event(self) -> RelayResult<Event> {
        if self.id.trim().is_empty() {
            return Err(RelayError::Source("Graph returned an event without an id".into()));
        }

        let start = parse_graph_time(&self.start, &self.id)?;
        let end = parse_graph_time(&self.end, &self.id)?;
        let organizer = self
            .organizer
            .and_then(|o| o.email_address.name.or(o.email_address.address))
            .unwrap_or_default();

        Ok(Event {
            id: self.id,
            subject: self.subject.unwrap_or_default(),
            start,
            end,
            organizer,
        })
    }
}

fn parse_graph_time(value: &GraphDateTime, id: &str) -> RelayResult<chrono::DateTime<chrono::Utc>> {
    normalize_zoned(&value.date_time, value.time_zone.as_deref().unwrap_or(""))
        .map_err(|e| RelayError::Source(format!("Event {}: {}", id, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn window() -> TimeWindow {
        TimeWindow::starting_at(
            Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap(),
            Duration::hours(1),
        )
    }

    fn graph_event(id: &str, start: &str, tz: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "subject": format!("Meeting {id}"),
            "start": { "dateTime": start, "timeZone": tz },
            "end": { "dateTime": start, "timeZone": tz },
            "organizer": { "emailAddress": { "name": "Bob", "address": "bob@example.com" } }
        })
    }

    fn source(server: &MockServer) -> OutlookSource {
        OutlookSource::new(Client::new(), "token".to_string()).with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_fetch_normalizes_zones_and_follows_next_link() {
        let server = MockServer::start().await;
        let next = format!("{}/page2", server.uri());

        Mock::given(method("GET"))
            .and(path("/me/calendarview"))
            .and(query_param("StartDateTime", "2025-01-10T09:00:00+00:00"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [graph_event("a", "2025-01-10T09:30:00.0000000", "UTC")],
                "@odata.nextLink": next
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [graph_event("b", "2025-01-10T04:15:00", "America/New_York")]
            })))
            .mount(&server)
            .await;

        let events = source(&server).fetch_events(&window()).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "a");
        assert_eq!(events[0].start.to_rfc3339(), "2025-01-10T09:30:00+00:00");
        assert_eq!(events[0].organizer, "Bob");
        assert_eq!(events[1].start.to_rfc3339(), "2025-01-10T09:15:00+00:00");
    }

    #[tokio::test]
    async fn test_fetch_failure_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("InvalidAuthenticationToken"))
            .mount(&server)
            .await;

        let err = source(&server).fetch_events(&window()).await.unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, RelayError::Source(_)), "got {:?}", err);
        assert!(msg.contains("401"), "got: {}", msg);
        assert!(msg.contains("InvalidAuthenticationToken"), "got: {}", msg);
    }

    #[tokio::test]
    async fn test_specific_calendar_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/calendars/cal-7/calendarview"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let events = source(&server)
            .with_calendar_id(Some("cal-7".to_string()))
            .fetch_events(&window())
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let raw: GraphEvent =
            serde_json::from_value(graph_event("", "2025-01-10T09:30:00", "UTC")).unwrap();
        assert!(raw.into_event().is_err());
    }

    #[test]
    fn test_organizer_falls_back_to_address() {
        let raw: GraphEvent = serde_json::from_value(serde_json::json!({
            "id": "x",
            "start": { "dateTime": "2025-01-10T09:30:00", "timeZone": "UTC" },
            "end": { "dateTime": "2025-01-10T10:30:00", "timeZone": "UTC" },
            "organizer": { "emailAddress": { "address": "carol@example.com" } }
        }))
        .unwrap();

        let event = raw.into_event().unwrap();
        assert_eq!(event.organizer, "carol@example.com");
        assert_eq!(event.subject, "");
    }
}
