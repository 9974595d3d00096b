//! Recurrence resolution: is a medicine due on a given date?
//!
//! Rules, relative to the medicine's start date:
//! - Daily: every date on or after the start
//! - Weekly: every 7th day offset (0, 7, 14, ...)
//! - Monthly: every date sharing the start's day-of-month
//!
//! Resolution never looks at the end date; window checks belong to callers.

use crate::dates::days_between;
use crate::Frequency;
use chrono::{Datelike, NaiveDate};

/// Outcome of resolving a frequency against a target date
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub scheduled: bool,
    /// Whole days since the start date; negative when the target precedes it
    pub day_offset: i64,
}

/// Decide whether `target` is a due date for a medicine starting on `start`
pub fn resolve(frequency: Frequency, start: NaiveDate, target: NaiveDate) -> Resolution {
    let day_offset = days_between(start, target);

    if day_offset < 0 {
        return Resolution {
            scheduled: false,
            day_offset,
        };
    }

    let scheduled = match frequency {
        Frequency::Daily => true,
        Frequency::Weekly => day_offset % 7 == 0,
        Frequency::Monthly => target.day() == start.day(),
    };

    tracing::trace!(
        %frequency,
        %start,
        %target,
        day_offset,
        scheduled,
        "Resolved recurrence"
    );

    Resolution {
        scheduled,
        day_offset,
    }
}

/// Iterate every due date for a medicine between `start` and `end`, inclusive
pub fn due_dates(
    frequency: Frequency,
    start: NaiveDate,
    end: NaiveDate,
) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
        .filter(move |d| resolve(frequency, start, *d).scheduled)
}
