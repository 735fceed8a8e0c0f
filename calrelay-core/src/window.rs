//! Half-open time window for a single sync pass.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// `[start, end)` window handed to the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window from two instants, swapping them if given backwards.
    pub fn new(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        if a <= b {
            TimeWindow { start: a, end: b }
        } else {
            TimeWindow { start: b, end: a }
        }
    }

    /// Rolling window `[at, at + interval)`.
    pub fn starting_at(at: DateTime<Utc>, interval: Duration) -> Self {
        Self::new(at, at + interval)
    }

    /// Rolling window `[now, now + interval)`.
    pub fn from_now(interval: Duration) -> Self {
        Self::starting_at(Utc::now(), interval)
    }

    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339()
    }

    pub fn end_rfc3339(&self) -> String {
        self.end.to_rfc3339()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_rfc3339(), self.end_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_negative_interval_swaps_bounds() {
        let at = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();
        let window = TimeWindow::starting_at(at, Duration::hours(-1));
        assert_eq!(window.start, at - Duration::hours(1));
        assert_eq!(window.end, at);
    }

    #[test]
    fn test_display_is_half_open() {
        let at = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();
        let window = TimeWindow::starting_at(at, Duration::hours(1));
        assert_eq!(
            window.to_string(),
            "[2025-03-20T12:00:00+00:00, 2025-03-20T13:00:00+00:00)"
        );
    }
}
