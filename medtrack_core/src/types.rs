//! Core domain types for the medication schedule engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Recurrence frequency and daily time slots
//! - Per-day taken status
//! - Medicine entries and the per-user schedule document

use crate::ledger::TakenLedger;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Recurrence
// ============================================================================

/// Recurrence rule governing which calendar dates a medicine is due
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for Frequency {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(crate::Error::InvalidFrequency(format!(
                "'{}' (expected daily, weekly or monthly)",
                other
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
        }
    }
}

// ============================================================================
// Time Slots
// ============================================================================

/// One of the three fixed daily dosing slots
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Dinner,
}

impl TimeSlot {
    /// All slots in display order
    pub const ALL: [TimeSlot; 3] = [TimeSlot::Morning, TimeSlot::Afternoon, TimeSlot::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::Dinner => "dinner",
        }
    }
}

impl FromStr for TimeSlot {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "morning" => Ok(TimeSlot::Morning),
            "afternoon" => Ok(TimeSlot::Afternoon),
            "dinner" => Ok(TimeSlot::Dinner),
            other => Err(crate::Error::InvalidSlot(format!(
                "'{}' (expected morning, afternoon or dinner)",
                other
            ))),
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the daily slots a medicine is taken in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TimeSlots {
    #[serde(default)]
    pub morning: bool,
    #[serde(default)]
    pub afternoon: bool,
    #[serde(default)]
    pub dinner: bool,
}

impl TimeSlots {
    pub fn is_enabled(&self, slot: TimeSlot) -> bool {
        match slot {
            TimeSlot::Morning => self.morning,
            TimeSlot::Afternoon => self.afternoon,
            TimeSlot::Dinner => self.dinner,
        }
    }

    /// Enabled slots in display order
    pub fn enabled(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        TimeSlot::ALL.into_iter().filter(|s| self.is_enabled(*s))
    }
}

// ============================================================================
// Duration Window and Day Status
// ============================================================================

/// Inclusive calendar window a medicine is active in, at day granularity
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DoseWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DoseWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Whole days from start to `date`; negative before the window
    pub fn day_offset(&self, date: NaiveDate) -> i64 {
        crate::dates::days_between(self.start_date, date)
    }
}

/// Taken flags for one medicine on one day
///
/// A missing record for an offset is equivalent to `DayStatus::default()`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DayStatus {
    #[serde(default)]
    pub morning_taken: bool,
    #[serde(default)]
    pub afternoon_taken: bool,
    #[serde(default)]
    pub dinner_taken: bool,
}

impl DayStatus {
    pub fn get(&self, slot: TimeSlot) -> bool {
        match slot {
            TimeSlot::Morning => self.morning_taken,
            TimeSlot::Afternoon => self.afternoon_taken,
            TimeSlot::Dinner => self.dinner_taken,
        }
    }

    pub fn set(&mut self, slot: TimeSlot, value: bool) {
        match slot {
            TimeSlot::Morning => self.morning_taken = value,
            TimeSlot::Afternoon => self.afternoon_taken = value,
            TimeSlot::Dinner => self.dinner_taken = value,
        }
    }
}

// ============================================================================
// Medicine Entry and Schedule
// ============================================================================

/// A validated medicine definition with its per-day taken ledger
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicineEntry {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dosage: String,
    pub frequency: Frequency,
    pub time_slots: TimeSlots,
    pub duration: DoseWindow,
    #[serde(default)]
    pub taken: TakenLedger,
}

/// A user's medicine schedule, the unit of persistence
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub user_id: String,
    #[serde(default)]
    pub medicines: Vec<MedicineEntry>,
}

impl Schedule {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            medicines: Vec::new(),
        }
    }

    pub fn find_medicine(&self, id: Uuid) -> Option<&MedicineEntry> {
        self.medicines.iter().find(|m| m.id == id)
    }

    pub fn find_medicine_mut(&mut self, id: Uuid) -> Option<&mut MedicineEntry> {
        self.medicines.iter_mut().find(|m| m.id == id)
    }
}
