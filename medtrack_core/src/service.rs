//! Request-level operations wiring the engine to a repository.
//!
//! Each operation loads one snapshot, runs the pure engine over it, and
//! hands any resulting write to the repository.

use crate::daily_view::{build_daily_view_for, DailyView};
use crate::status::{plan_update, required_fields, StatusRequest, StatusUpdate, UpdateOptions};
use crate::status_log::{StatusEvent, StatusSink};
use crate::store::ScheduleRepository;
use crate::validator::{validate_all, EntryLimits};
use crate::{Error, MedicineEntry, Result, Schedule};
use chrono::Utc;
use serde_json::Value;

/// Validate all raw entries, then append them to the user's schedule
///
/// Nothing is appended if any entry is invalid. Returns the new entries.
pub fn create_entries(
    repo: &dyn ScheduleRepository,
    user_id: &str,
    raw_entries: &[Value],
    limits: EntryLimits,
) -> Result<Vec<MedicineEntry>> {
    if raw_entries.is_empty() {
        return Err(Error::MissingField("medicines".into()));
    }

    let entries = validate_all(raw_entries, limits)?;
    repo.append_entries(user_id, entries.clone())?;
    Ok(entries)
}

/// Load the user's schedule or fail with `NotFound`
pub fn load_schedule(repo: &dyn ScheduleRepository, user_id: &str) -> Result<Schedule> {
    repo.find(user_id)?
        .ok_or_else(|| Error::NotFound(format!("no schedule for user {}", user_id)))
}

/// Build the slot-grouped view of `date` for a user
pub fn daily_view(repo: &dyn ScheduleRepository, user_id: &str, date: &str) -> Result<DailyView> {
    let schedule = load_schedule(repo, user_id)?;
    build_daily_view_for(&schedule, date)
}

/// Validate a status update against the current snapshot and persist it
///
/// The write is a single field addressed by medicine, day offset and slot.
/// The audit event is appended only after the write succeeds; a failed
/// append is logged and does not fail the update.
pub fn update_status(
    repo: &dyn ScheduleRepository,
    sink: &mut dyn StatusSink,
    user_id: &str,
    request: &StatusRequest,
    options: UpdateOptions,
) -> Result<StatusUpdate> {
    required_fields(request)?;
    let schedule = load_schedule(repo, user_id)?;
    let change = plan_update(&schedule, request, options)?;
    repo.set_taken(&change)?;

    let update = change.echo();
    if let Err(e) = sink.append(&StatusEvent::from_update(&update, Utc::now())) {
        tracing::warn!(
            "Status of {} on {} saved but not logged: {}",
            update.medicine_id,
            update.date,
            e
        );
    }

    tracing::info!(
        "Marked {} {} on {} as {} for {}",
        update.medicine_id,
        update.time_slot,
        update.date,
        if update.is_taken { "taken" } else { "not taken" },
        update.user_id
    );
    Ok(update)
}
