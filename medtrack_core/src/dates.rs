//! Calendar helpers shared by the engine components.
//!
//! All schedule arithmetic happens on `NaiveDate`, i.e. dates already
//! normalized to midnight UTC. Instants (`NaiveDateTime`) are only kept
//! around while validating a new entry's duration.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Milliseconds in one day
pub const DAY_MS: i64 = 86_400_000;

/// Whole days from `start` to `end` (negative if `end` precedes `start`)
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Day span between two instants, rounded up to the next whole day
pub fn ceil_days(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let ms = (end - start).num_milliseconds();
    -((-ms).div_euclid(DAY_MS))
}

/// Parse a query/update date such as `2024-01-08`
///
/// Full timestamps are accepted too and truncated to their UTC calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    parse_instant_str(input.trim())
        .map(|dt| dt.date())
        .ok_or_else(|| Error::InvalidDate(format!("'{}' is not a valid date", input)))
}

/// Parse a JSON date value into a UTC instant
///
/// Strings may be plain dates, naive datetimes or RFC 3339 timestamps;
/// numbers are milliseconds since the Unix epoch.
pub fn parse_instant(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_instant_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}

fn parse_instant_str(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
