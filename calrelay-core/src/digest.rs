//! Human-readable digest of newly seen events.

use chrono::Duration;
use chrono_tz::Tz;

use crate::event::Event;

const START_FORMAT: &str = "%d %b %y %H:%M %Z";

/// Build one notification message covering every event, in the order given.
///
/// Each line reads `*subject* at *start* [ duration ]`, with `start`
/// rendered in `tz`.
pub fn build_digest(events: &[Event], tz: Tz) -> String {
    let mut msg = String::new();
    for event in events {
        msg.push_str(&digest_line(event, tz));
        msg.push('\n');
    }
    msg
}

fn digest_line(event: &Event, tz: Tz) -> String {
    format!(
        "*{}* at *{}* [ {} ]",
        event.subject,
        event.start.with_timezone(&tz).format(START_FORMAT),
        format_duration(event.duration())
    )
}

/// Compact `1h30m0s` style rendering. Leading zero units are dropped, a zero
/// duration renders as `0s`, and negative durations get a leading `-`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    if total == 0 {
        return "0s".to_string();
    }

    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{sign}{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m{seconds}s")
    } else {
        format!("{sign}{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_event(subject: &str, hour: u32, minutes_long: i64) -> Event {
        let start = Utc.with_ymd_and_hms(2025, 1, 10, hour, 0, 0).unwrap();
        Event {
            id: format!("id-{subject}"),
            subject: subject.to_string(),
            start,
            end: start + Duration::minutes(minutes_long),
            organizer: String::new(),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::zero()), "0s");
        assert_eq!(format_duration(Duration::seconds(45)), "45s");
        assert_eq!(format_duration(Duration::minutes(30)), "30m0s");
        assert_eq!(format_duration(Duration::minutes(90)), "1h30m0s");
        assert_eq!(format_duration(Duration::minutes(-15)), "-15m0s");
    }

    #[test]
    fn test_digest_line_uses_reference_timezone() {
        let events = vec![make_event("Review", 14, 60)];
        let digest = build_digest(&events, chrono_tz::America::New_York);
        assert_eq!(digest, "*Review* at *10 Jan 25 09:00 EST* [ 1h0m0s ]\n");
    }

    #[test]
    fn test_digest_keeps_given_order() {
        let events = vec![make_event("B", 9, 30), make_event("A", 8, 30)];
        let digest = build_digest(&events, chrono_tz::UTC);
        let lines: Vec<_> = digest.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("*B*"), "got: {}", lines[0]);
        assert!(lines[1].starts_with("*A*"), "got: {}", lines[1]);
    }

    #[test]
    fn test_empty_digest() {
        assert_eq!(build_digest(&[], chrono_tz::UTC), "");
    }
}
