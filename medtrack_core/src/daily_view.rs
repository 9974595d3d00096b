//! Consolidated per-day view of a schedule, grouped by time slot.

use crate::dates::parse_date;
use crate::recurrence::resolve;
use crate::{Result, Schedule, TimeSlot};
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// One medicine due in one slot
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DoseItem {
    pub id: Uuid,
    pub name: String,
    pub dosage: String,
    pub description: String,
    pub is_taken: bool,
}

/// Overall counts across the three slots
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ViewTotals {
    pub total_medicines: usize,
    pub total_taken: usize,
    pub morning_taken: usize,
    pub afternoon_taken: usize,
    pub dinner_taken: usize,
}

/// All doses due on one date
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyView {
    pub date: NaiveDate,
    pub morning_count: usize,
    pub afternoon_count: usize,
    pub dinner_count: usize,
    pub morning: Vec<DoseItem>,
    pub afternoon: Vec<DoseItem>,
    pub dinner: Vec<DoseItem>,
    pub totals: ViewTotals,
}

impl DailyView {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            morning_count: 0,
            afternoon_count: 0,
            dinner_count: 0,
            morning: Vec::new(),
            afternoon: Vec::new(),
            dinner: Vec::new(),
            totals: ViewTotals::default(),
        }
    }

    pub fn slot(&self, slot: TimeSlot) -> &[DoseItem] {
        match slot {
            TimeSlot::Morning => &self.morning,
            TimeSlot::Afternoon => &self.afternoon,
            TimeSlot::Dinner => &self.dinner,
        }
    }

    fn slot_mut(&mut self, slot: TimeSlot) -> &mut Vec<DoseItem> {
        match slot {
            TimeSlot::Morning => &mut self.morning,
            TimeSlot::Afternoon => &mut self.afternoon,
            TimeSlot::Dinner => &mut self.dinner,
        }
    }

    fn tally(&mut self) {
        let taken = |items: &[DoseItem]| items.iter().filter(|i| i.is_taken).count();

        self.morning_count = self.morning.len();
        self.afternoon_count = self.afternoon.len();
        self.dinner_count = self.dinner.len();

        self.totals = ViewTotals {
            total_medicines: self.morning_count + self.afternoon_count + self.dinner_count,
            morning_taken: taken(&self.morning),
            afternoon_taken: taken(&self.afternoon),
            dinner_taken: taken(&self.dinner),
            total_taken: 0,
        };
        self.totals.total_taken =
            self.totals.morning_taken + self.totals.afternoon_taken + self.totals.dinner_taken;
    }
}

/// Build the slot-grouped view of everything due on `date`
///
/// Medicines keep their schedule order within each slot.
pub fn build_daily_view(schedule: &Schedule, date: NaiveDate) -> DailyView {
    let mut view = DailyView::empty(date);

    for medicine in &schedule.medicines {
        if !medicine.duration.contains(date) {
            tracing::trace!("Skipping {}: {} outside its window", medicine.id, date);
            continue;
        }

        let resolution = resolve(medicine.frequency, medicine.duration.start_date, date);
        if !resolution.scheduled {
            tracing::trace!("Skipping {}: not due on {}", medicine.id, date);
            continue;
        }

        let status = medicine.taken.get(resolution.day_offset);
        for slot in medicine.time_slots.enabled() {
            view.slot_mut(slot).push(DoseItem {
                id: medicine.id,
                name: medicine.name.clone(),
                dosage: medicine.dosage.clone(),
                description: medicine.description.clone(),
                is_taken: status.get(slot),
            });
        }
    }

    view.tally();

    tracing::debug!(
        user = %schedule.user_id,
        %date,
        total = view.totals.total_medicines,
        taken = view.totals.total_taken,
        "Built daily view"
    );

    view
}

/// Parse `date` (e.g. `2024-01-08`) and build the view for it
pub fn build_daily_view_for(schedule: &Schedule, date: &str) -> Result<DailyView> {
    let date = parse_date(date)?;
    Ok(build_daily_view(schedule, date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TakenLedger;
    use crate::{DoseWindow, Frequency, MedicineEntry, TimeSlots};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn medicine(name: &str, frequency: Frequency, slots: TimeSlots) -> MedicineEntry {
        MedicineEntry {
            id: Uuid::new_v4(),
            name: name.into(),
            description: format!("{} description", name),
            dosage: "1 tablet".into(),
            frequency,
            time_slots: slots,
            duration: DoseWindow {
                start_date: date(2024, 1, 1),
                end_date: date(2024, 1, 31),
            },
            taken: TakenLedger::with_len(31),
        }
    }

    fn all_slots() -> TimeSlots {
        TimeSlots {
            morning: true,
            afternoon: true,
            dinner: true,
        }
    }

    #[test]
    fn test_empty_schedule() {
        let view = build_daily_view(&Schedule::new("u1"), date(2024, 1, 1));
        assert!(view.morning.is_empty());
        assert!(view.afternoon.is_empty());
        assert!(view.dinner.is_empty());
        assert_eq!(view.totals, ViewTotals::default());
    }

    #[test]
    fn test_groups_by_enabled_slots() {
        let mut schedule = Schedule::new("u1");
        schedule.medicines.push(medicine("A", Frequency::Daily, all_slots()));
        schedule.medicines.push(medicine(
            "B",
            Frequency::Daily,
            TimeSlots {
                dinner: true,
                ..Default::default()
            },
        ));

        let view = build_daily_view(&schedule, date(2024, 1, 3));
        assert_eq!(view.morning_count, 1);
        assert_eq!(view.afternoon_count, 1);
        assert_eq!(view.dinner_count, 2);
        assert_eq!(view.totals.total_medicines, 4);

        let dinner: Vec<_> = view.dinner.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(dinner, vec!["A", "B"]);
    }

    #[test]
    fn test_skips_outside_window_and_off_days() {
        let mut schedule = Schedule::new("u1");
        schedule.medicines.push(medicine("daily", Frequency::Daily, all_slots()));
        schedule.medicines.push(medicine("weekly", Frequency::Weekly, all_slots()));

        let view = build_daily_view(&schedule, date(2024, 1, 3));
        assert_eq!(view.morning.len(), 1);
        assert_eq!(view.morning[0].name, "daily");

        let view = build_daily_view(&schedule, date(2024, 1, 8));
        assert_eq!(view.morning.len(), 2);

        let view = build_daily_view(&schedule, date(2024, 2, 1));
        assert_eq!(view.totals.total_medicines, 0);

        let view = build_daily_view(&schedule, date(2023, 12, 31));
        assert_eq!(view.totals.total_medicines, 0);
    }

    #[test]
    fn test_reports_taken_flags_and_totals() {
        let mut med = medicine("A", Frequency::Daily, all_slots());
        med.taken.set(4, TimeSlot::Morning, true).unwrap();
        med.taken.set(4, TimeSlot::Dinner, true).unwrap();
        let mut schedule = Schedule::new("u1");
        schedule.medicines.push(med);

        let view = build_daily_view(&schedule, date(2024, 1, 5));
        assert!(view.morning[0].is_taken);
        assert!(!view.afternoon[0].is_taken);
        assert!(view.dinner[0].is_taken);
        assert_eq!(view.totals.total_taken, 2);
        assert_eq!(view.totals.morning_taken, 1);
        assert_eq!(view.totals.afternoon_taken, 0);
    }

    #[test]
    fn test_short_ledger_reads_as_untaken() {
        let mut med = medicine("A", Frequency::Daily, all_slots());
        med.taken = TakenLedger::with_len(2);
        let mut schedule = Schedule::new("u1");
        schedule.medicines.push(med);

        let view = build_daily_view(&schedule, date(2024, 1, 20));
        assert_eq!(view.morning.len(), 1);
        assert!(!view.morning[0].is_taken);
    }

    #[test]
    fn test_unparsable_date_rejected() {
        let schedule = Schedule::new("u1");
        assert!(matches!(
            build_daily_view_for(&schedule, "2024-02-30"),
            Err(crate::Error::InvalidDate(_))
        ));
        assert!(build_daily_view_for(&schedule, "2024-02-29").is_ok());
    }

    #[test]
    fn test_json_shape() {
        let mut schedule = Schedule::new("u1");
        schedule.medicines.push(medicine("A", Frequency::Daily, all_slots()));
        let json = serde_json::to_value(build_daily_view(&schedule, date(2024, 1, 1))).unwrap();
        assert_eq!(json["morningCount"], 1);
        assert_eq!(json["morning"][0]["isTaken"], false);
        assert_eq!(json["totals"]["totalMedicines"], 3);
    }
}
