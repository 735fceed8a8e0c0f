//! Provider-neutral event type.
//!
//! Event sources convert their API payloads into `Event`, and the rest of
//! the pipeline (dedup, digest, replication) works exclusively with it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A calendar occurrence fetched from the source calendar.
///
/// `id` is the dedup key and is owned by the source system. `start` and
/// `end` are normalized to UTC when the event is built; `end` may precede
/// `start` if the source says so.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub organizer: String,
}

impl Event {
    /// Signed length of the event. Negative when the source reports an end
    /// before the start.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Title used when mirroring into the replica calendar.
    pub fn replica_summary(&self) -> String {
        format!("{} by [ {} ]", self.subject, self.organizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_event(start_hour: u32, end_hour: u32) -> Event {
        Event {
            id: "evt-1".to_string(),
            subject: "Standup".to_string(),
            start: Utc.with_ymd_and_hms(2025, 3, 20, start_hour, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 20, end_hour, 0, 0).unwrap(),
            organizer: "Alice".to_string(),
        }
    }

    #[test]
    fn test_duration_can_be_negative() {
        let event = make_event(10, 9);
        assert_eq!(event.duration(), Duration::hours(-1));
    }

    #[test]
    fn test_replica_summary_includes_organizer() {
        let event = make_event(9, 10);
        assert_eq!(event.replica_summary(), "Standup by [ Alice ]");
    }
}
