//! Taken/untaken status updates.
//!
//! An update is split into a validating plan over a read-only snapshot
//! ([`plan_update`]) and a single-field write ([`StatusChange::apply`]),
//! so storage layers can persist the write without replacing the whole
//! schedule document.

use crate::dates::parse_date;
use crate::recurrence::resolve;
use crate::validator::truthy;
use crate::{Error, Result, Schedule, TimeSlot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A raw status update as received from the calling layer
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    #[serde(default)]
    pub medicine_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time_slot: Option<String>,
    #[serde(default)]
    pub is_taken: Value,
}

impl StatusRequest {
    pub fn new(medicine_id: impl ToString, date: &str, time_slot: &str, is_taken: bool) -> Self {
        Self {
            medicine_id: Some(medicine_id.to_string()),
            date: Some(date.into()),
            time_slot: Some(time_slot.into()),
            is_taken: Value::Bool(is_taken),
        }
    }
}

/// Knobs for update validation
#[derive(Clone, Copy, Debug)]
pub struct UpdateOptions {
    /// Reject writes to a slot the medicine is not taken in
    pub strict_time_slots: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            strict_time_slots: true,
        }
    }
}

/// A fully validated single-field write
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusChange {
    pub user_id: String,
    pub medicine_id: Uuid,
    pub date: NaiveDate,
    pub day_offset: i64,
    pub time_slot: TimeSlot,
    pub is_taken: bool,
}

/// Echo of an applied update
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub user_id: String,
    pub medicine_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub is_taken: bool,
}

impl StatusChange {
    /// Write the change into `schedule`, touching exactly one flag
    pub fn apply(&self, schedule: &mut Schedule) -> Result<()> {
        let medicine = schedule
            .find_medicine_mut(self.medicine_id)
            .ok_or_else(|| Error::NotFound(format!("medicine {}", self.medicine_id)))?;
        medicine
            .taken
            .set(self.day_offset, self.time_slot, self.is_taken)
    }

    pub fn echo(&self) -> StatusUpdate {
        StatusUpdate {
            user_id: self.user_id.clone(),
            medicine_id: self.medicine_id,
            date: self.date,
            time_slot: self.time_slot,
            is_taken: self.is_taken,
        }
    }
}

/// Validate a request against a schedule snapshot without mutating it
///
/// Checks run in order and fail fast: required fields, slot name, date,
/// medicine lookup, ledger range, recurrence, then (when strict) whether
/// the slot is enabled for the medicine.
pub fn plan_update(
    schedule: &Schedule,
    request: &StatusRequest,
    options: UpdateOptions,
) -> Result<StatusChange> {
    let (medicine_id, time_slot, date) = required_fields(request)?;

    let time_slot: TimeSlot = time_slot.parse()?;
    let date = parse_date(date)?;

    let medicine = Uuid::parse_str(medicine_id)
        .ok()
        .and_then(|id| schedule.find_medicine(id))
        .ok_or_else(|| Error::NotFound(format!("medicine {}", medicine_id)))?;

    let day_offset = medicine.duration.day_offset(date);
    if !medicine.duration.contains(date) || !medicine.taken.contains(day_offset) {
        return Err(Error::OutOfRange(format!(
            "{} is outside {}..={} for medicine {}",
            date, medicine.duration.start_date, medicine.duration.end_date, medicine.id
        )));
    }

    let resolution = resolve(medicine.frequency, medicine.duration.start_date, date);
    if !resolution.scheduled {
        return Err(Error::NotScheduled(format!(
            "{} medicine {} is not due on {}",
            medicine.frequency, medicine.id, date
        )));
    }

    if options.strict_time_slots && !medicine.time_slots.is_enabled(time_slot) {
        return Err(Error::InvalidSlot(format!(
            "medicine {} is not taken in the {} slot",
            medicine.id, time_slot
        )));
    }

    Ok(StatusChange {
        user_id: schedule.user_id.clone(),
        medicine_id: medicine.id,
        date,
        day_offset,
        time_slot,
        is_taken: truthy(&request.is_taken),
    })
}

/// The non-empty `(medicineId, timeSlot, date)` of a request, checked in that order
pub fn required_fields(request: &StatusRequest) -> Result<(&str, &str, &str)> {
    let medicine_id =
        present(&request.medicine_id).ok_or_else(|| Error::MissingField("medicineId".into()))?;
    let time_slot =
        present(&request.time_slot).ok_or_else(|| Error::MissingField("timeSlot".into()))?;
    let date = present(&request.date).ok_or_else(|| Error::MissingField("date".into()))?;
    Ok((medicine_id, time_slot, date))
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Validate and apply a status update in place
pub fn update_status(
    schedule: &mut Schedule,
    request: &StatusRequest,
    options: UpdateOptions,
) -> Result<StatusUpdate> {
    let change = plan_update(schedule, request, options)?;
    change.apply(schedule)?;

    tracing::info!(
        user = %change.user_id,
        medicine = %change.medicine_id,
        date = %change.date,
        slot = %change.time_slot,
        taken = change.is_taken,
        "Updated medicine status"
    );

    Ok(change.echo())
}
