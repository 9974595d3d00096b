//! Validation of raw medicine definitions before they enter a schedule.
//!
//! Raw payloads arrive as loosely-typed JSON. Checks run in order:
//! 1. `name`, `frequency`, `timeSlots`, `duration` present
//! 2. `frequency` is one of daily/weekly/monthly
//! 3. `timeSlots` is an object naming at least one known slot
//! 4. `duration` dates parse, `startDate < endDate`, and the span stays
//!    within [`EntryLimits::max_span_days`]
//!
//! Slot flags are coerced by truthiness, so `{"morning": 1}` enables the
//! morning slot and `{"morning": false}` passes validation with no slot
//! enabled at all.

use crate::dates::{ceil_days, parse_instant};
use crate::ledger::TakenLedger;
use crate::{DoseWindow, Error, Frequency, MedicineEntry, Result, TimeSlots};
use serde_json::{Map, Value};
use uuid::Uuid;

const SLOT_KEYS: [&str; 3] = ["morning", "afternoon", "dinner"];

/// Default cap on a dosing window, roughly ten years
pub const DEFAULT_MAX_SPAN_DAYS: i64 = 3660;

/// Bounds applied to incoming entries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryLimits {
    /// Longest accepted `startDate..endDate` span, in rounded-up days
    pub max_span_days: i64,
}

impl Default for EntryLimits {
    fn default() -> Self {
        Self {
            max_span_days: DEFAULT_MAX_SPAN_DAYS,
        }
    }
}

/// Validate a raw entry with the default limits
pub fn validate(raw: &Value) -> Result<MedicineEntry> {
    validate_with(raw, EntryLimits::default())
}

/// Validate a raw entry and materialize it with a fresh id and empty ledger
pub fn validate_with(raw: &Value, limits: EntryLimits) -> Result<MedicineEntry> {
    let obj = raw
        .as_object()
        .ok_or_else(|| Error::MissingField("medicine entry must be an object".into()))?;

    let name = require(obj, "name")?;
    let frequency = require(obj, "frequency")?;
    let time_slots = require(obj, "timeSlots")?;
    let duration = require(obj, "duration")?;

    let name = match name {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let frequency = match frequency {
        Value::String(s) => s.parse::<Frequency>()?,
        other => {
            return Err(Error::InvalidFrequency(format!(
                "expected a string, got {}",
                other
            )))
        }
    };

    let time_slots = parse_time_slots(time_slots)?;
    let (window, days_diff) = parse_duration(duration, limits)?;

    // Ledger spans the rounded-up instant difference plus the start day.
    let len = usize::try_from(days_diff + 1).unwrap_or(0);

    let entry = MedicineEntry {
        id: Uuid::new_v4(),
        name,
        description: optional_text(obj, "description"),
        dosage: optional_text(obj, "dosage"),
        frequency,
        time_slots,
        duration: window,
        taken: TakenLedger::with_len(len),
    };

    tracing::debug!(
        id = %entry.id,
        name = %entry.name,
        frequency = %entry.frequency,
        days = entry.taken.len(),
        "Validated medicine entry"
    );

    Ok(entry)
}

/// Validate every raw entry, failing on the first invalid one
pub fn validate_all(raw: &[Value], limits: EntryLimits) -> Result<Vec<MedicineEntry>> {
    raw.iter()
        .enumerate()
        .map(|(i, entry)| {
            validate_with(entry, limits).map_err(|e| {
                tracing::warn!("Rejected medicine entry #{}: {}", i, e);
                e
            })
        })
        .collect()
}

/// JavaScript-style truthiness for loosely typed flags
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn require<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    match obj.get(key) {
        Some(v) if truthy(v) => Ok(v),
        _ => Err(Error::MissingField(key.into())),
    }
}

fn optional_text(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn parse_time_slots(value: &Value) -> Result<TimeSlots> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::InvalidTimeSlots("timeSlots must be an object".into()))?;

    if !SLOT_KEYS.iter().any(|k| obj.contains_key(*k)) {
        return Err(Error::InvalidTimeSlots(
            "timeSlots must name at least one of morning, afternoon, dinner".into(),
        ));
    }

    let flag = |key: &str| obj.get(key).map_or(false, truthy);
    Ok(TimeSlots {
        morning: flag("morning"),
        afternoon: flag("afternoon"),
        dinner: flag("dinner"),
    })
}

/// Parse the duration object into a midnight-normalized window and the
/// rounded-up day difference between the raw instants.
fn parse_duration(value: &Value, limits: EntryLimits) -> Result<(DoseWindow, i64)> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::InvalidDuration("duration must be an object".into()))?;

    let instant = |key: &str| {
        obj.get(key)
            .and_then(parse_instant)
            .ok_or_else(|| Error::InvalidDuration(format!("{} is not a valid date", key)))
    };
    let start = instant("startDate")?;
    let end = instant("endDate")?;

    if start >= end {
        return Err(Error::InvalidDuration(format!(
            "startDate {} must be before endDate {}",
            start, end
        )));
    }

    let days_diff = ceil_days(start, end);
    if days_diff > limits.max_span_days {
        return Err(Error::InvalidDuration(format!(
            "window of {} days exceeds the limit of {} days",
            days_diff, limits.max_span_days
        )));
    }

    let window = DoseWindow {
        start_date: start.date(),
        end_date: end.date(),
    };
    Ok((window, days_diff))
}
