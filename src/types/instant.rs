//! Instant parsing shared by snapshot loading and date-range queries.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a caller-supplied bound or stored timestamp as an instant.
///
/// Accepts RFC 3339 timestamps, naive date-times (taken as UTC) and plain
/// `YYYY-MM-DD` dates, which resolve to midnight UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde helper for metadata instants written by older snapshot formats.
///
/// Unparseable or empty values fall back to the Unix epoch; the next save
/// overwrites them.
pub fn lenient_instant<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(parse_instant)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
}

/// Serde helper for optional record timestamps.
///
/// Strings go through [`parse_instant`], integers are taken as Unix
/// milliseconds, and anything unreadable is treated as absent.
pub fn lenient_optional_instant<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::String(s) => parse_instant(&s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}
