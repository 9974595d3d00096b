//! CSV export of a schedule's taken ledger.
//!
//! One row per medicine per due date. Slot columns read `taken`, `missed`,
//! or are left empty when the medicine is not taken in that slot.

use crate::recurrence::due_dates;
use crate::{Result, Schedule, TimeSlot};
use std::io::Write;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct LedgerRow<'a> {
    medicine_id: String,
    name: &'a str,
    date: String,
    morning: &'static str,
    afternoon: &'static str,
    dinner: &'static str,
}

fn cell(enabled: bool, taken: bool) -> &'static str {
    match (enabled, taken) {
        (false, _) => "",
        (true, true) => "taken",
        (true, false) => "missed",
    }
}

/// Write the ledger as CSV (with headers) and return the number of rows
pub fn write_ledger_csv<W: Write>(schedule: &Schedule, writer: W) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);
    let mut rows = 0;

    for medicine in &schedule.medicines {
        let window = &medicine.duration;
        for date in due_dates(medicine.frequency, window.start_date, window.end_date) {
            let status = medicine.taken.get(window.day_offset(date));
            let slot = |s: TimeSlot| cell(medicine.time_slots.is_enabled(s), status.get(s));

            writer.serialize(LedgerRow {
                medicine_id: medicine.id.to_string(),
                name: &medicine.name,
                date: date.to_string(),
                morning: slot(TimeSlot::Morning),
                afternoon: slot(TimeSlot::Afternoon),
                dinner: slot(TimeSlot::Dinner),
            })?;
            rows += 1;
        }
    }

    writer.flush()?;
    tracing::info!("Exported {} ledger rows for {}", rows, schedule.user_id);
    Ok(rows)
}

/// Export the ledger to a file, replacing any previous export
pub fn export_to_path(schedule: &Schedule, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let rows = write_ledger_csv(schedule, &file)?;
    file.sync_all()?;
    Ok(rows)
}
