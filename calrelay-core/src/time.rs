//! Timezone normalization for source payloads.
//!
//! Source calendars hand out wall-clock timestamps paired with a zone
//! identifier. Everything downstream compares instants, so timestamps are
//! converted to UTC as soon as they are parsed.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{RelayError, RelayResult};

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse a `(dateTime, timeZone)` pair into a UTC instant.
///
/// Timestamps that already carry an offset (`Z` or `+hh:mm`) are taken as-is.
/// Naive timestamps are interpreted in `time_zone`, an IANA name; an empty
/// zone or `UTC` means UTC.
pub fn normalize_zoned(date_time: &str, time_zone: &str) -> RelayResult<DateTime<Utc>> {
    let value = date_time.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(value, NAIVE_FORMAT)
        .map_err(|e| RelayError::TimeParse(format!("Invalid timestamp '{}': {}", value, e)))?;

    let zone = time_zone.trim();
    if zone.is_empty() || zone.eq_ignore_ascii_case("utc") {
        return Ok(naive.and_utc());
    }

    let tz = parse_timezone(zone)?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // Ambiguous wall-clock time during a DST fall-back: take the first.
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(RelayError::TimeParse(format!(
            "'{}' does not exist in time zone {}",
            value, zone
        ))),
    }
}

/// Parse an IANA time zone name.
pub fn parse_timezone(name: &str) -> RelayResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| RelayError::TimeParse(format!("Unknown time zone '{}'", name)))
}
