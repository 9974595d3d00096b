//! Per-day taken ledger for one medicine.
//!
//! The ledger is a fixed-length vector addressed strictly by day offset
//! from the medicine's start date. Reads are forgiving (out-of-bounds
//! offsets read as all-false), writes are not.

use crate::{DayStatus, Error, Result, TimeSlot};
use serde::{Deserialize, Serialize};

/// Ordered per-day status records, index = day offset
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct TakenLedger(Vec<DayStatus>);

impl TakenLedger {
    /// A ledger of `len` all-false days
    pub fn with_len(len: usize) -> Self {
        Self(vec![DayStatus::default(); len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `day_offset` addresses a stored record
    pub fn contains(&self, day_offset: i64) -> bool {
        usize::try_from(day_offset).map_or(false, |i| i < self.0.len())
    }

    /// Status for `day_offset`, or all-false when the offset has no record
    pub fn get(&self, day_offset: i64) -> DayStatus {
        usize::try_from(day_offset)
            .ok()
            .and_then(|i| self.0.get(i))
            .copied()
            .unwrap_or_default()
    }

    /// Set a single slot flag on the record at `day_offset`
    pub fn set(&mut self, day_offset: i64, slot: TimeSlot, value: bool) -> Result<()> {
        let len = self.0.len();
        let status = usize::try_from(day_offset)
            .ok()
            .and_then(|i| self.0.get_mut(i))
            .ok_or_else(|| {
                Error::OutOfRange(format!(
                    "day offset {} outside ledger of {} days",
                    day_offset, len
                ))
            })?;
        status.set(slot, value);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DayStatus> {
        self.0.iter()
    }
}

impl From<Vec<DayStatus>> for TakenLedger {
    fn from(days: Vec<DayStatus>) -> Self {
        Self(days)
    }
}
