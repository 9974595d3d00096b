//! Adherence summary: how many due doses were marked taken.

use crate::recurrence::due_dates;
use crate::{MedicineEntry, Schedule};
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Due and taken dose counts for one medicine
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicineAdherence {
    pub id: Uuid,
    pub name: String,
    pub doses_due: usize,
    pub doses_taken: usize,
    /// `None` until at least one dose has come due
    pub rate: Option<f64>,
}

/// Adherence across a whole schedule up to a date
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceReport {
    pub as_of: NaiveDate,
    pub doses_due: usize,
    pub doses_taken: usize,
    pub rate: Option<f64>,
    pub medicines: Vec<MedicineAdherence>,
}

fn rate(taken: usize, due: usize) -> Option<f64> {
    (due > 0).then(|| taken as f64 / due as f64)
}

/// Count slot-doses due from the start date through `as_of` (capped at the end date)
pub fn medicine_adherence(medicine: &MedicineEntry, as_of: NaiveDate) -> MedicineAdherence {
    let window = &medicine.duration;
    let last = window.end_date.min(as_of);

    let mut doses_due = 0;
    let mut doses_taken = 0;
    for date in due_dates(medicine.frequency, window.start_date, last) {
        let status = medicine.taken.get(window.day_offset(date));
        for slot in medicine.time_slots.enabled() {
            doses_due += 1;
            if status.get(slot) {
                doses_taken += 1;
            }
        }
    }

    MedicineAdherence {
        id: medicine.id,
        name: medicine.name.clone(),
        doses_due,
        doses_taken,
        rate: rate(doses_taken, doses_due),
    }
}

pub fn report(schedule: &Schedule, as_of: NaiveDate) -> AdherenceReport {
    let medicines: Vec<_> = schedule
        .medicines
        .iter()
        .map(|m| medicine_adherence(m, as_of))
        .collect();

    let doses_due: usize = medicines.iter().map(|m| m.doses_due).sum();
    let doses_taken: usize = medicines.iter().map(|m| m.doses_taken).sum();

    tracing::debug!(
        "Adherence for {} as of {}: {}/{}",
        schedule.user_id,
        as_of,
        doses_taken,
        doses_due
    );

    AdherenceReport {
        as_of,
        doses_due,
        doses_taken,
        rate: rate(doses_taken, doses_due),
        medicines,
    }
}
