//! Reminder calculation.
//!
//! Each alarm on a schedule fires once per occurrence. Timed alarms are
//! offsets from the occurrence start; all-day alarms are offsets from the
//! midnight that opens the occurrence's first day.

use chrono::{DateTime, Duration, Local};
use serde::Serialize;

use crate::models::query::DateRange;
use crate::models::schedule::{Occurrence, Schedule};
use crate::services::schedule::recurrence::expand;
use crate::utils::date::start_of_day;

// Alarms fire at most a week before and nine hours after their occurrence.
const LOOK_AHEAD_DAYS: i64 = 8;
const LOOK_BEHIND_DAYS: i64 = 1;

/// One alarm firing for one occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub schedule_id: Option<i64>,
    pub title: String,
    pub occurrence_start: DateTime<Local>,
    pub fire_at: DateTime<Local>,
}

/// Every reminder that fires inside `range`, ordered by fire time.
pub fn reminders(schedules: &[Schedule], range: &DateRange) -> Vec<Reminder> {
    let search = widen(range);

    let mut found: Vec<Reminder> = schedules
        .iter()
        .filter(|schedule| !schedule.alarms.is_empty())
        .flat_map(|schedule| expand(schedule, &search))
        .flat_map(|occurrence| fire_times(&occurrence))
        .filter(|reminder| range.contains(reminder.fire_at))
        .collect();

    found.sort_by(|a, b| {
        a.fire_at
            .cmp(&b.fire_at)
            .then(a.schedule_id.cmp(&b.schedule_id))
    });
    found
}

fn fire_times(occurrence: &Occurrence) -> Vec<Reminder> {
    let schedule = &occurrence.schedule;
    let base = if schedule.all_day {
        start_of_day(occurrence.start().date_naive()).unwrap_or(occurrence.start())
    } else {
        occurrence.start()
    };

    schedule
        .alarms
        .iter()
        .map(|alarm| Reminder {
            schedule_id: schedule.id,
            title: schedule.title.clone(),
            occurrence_start: occurrence.start(),
            fire_at: base + alarm.trigger_offset(),
        })
        .collect()
}

fn widen(range: &DateRange) -> DateRange {
    let start = range
        .start
        .checked_sub_signed(Duration::days(LOOK_BEHIND_DAYS))
        .unwrap_or(range.start);
    let end = range
        .end
        .checked_add_signed(Duration::days(LOOK_AHEAD_DAYS))
        .unwrap_or(range.end);
    DateRange { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::alarm::Alarm;
    use crate::models::recurrence::RecurrenceKind;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_timed_alarm_offsets() {
        let mut schedule = Schedule::builder()
            .type_id(1)
            .title("Dentist")
            .start(at(7, 10, 14, 0))
            .end(at(7, 10, 15, 0))
            .alarm(Alarm::Minutes15Before)
            .alarm(Alarm::Day1Before)
            .build()
            .unwrap();
        schedule.id = Some(4);

        let range = DateRange::new(at(7, 1, 0, 0), at(8, 1, 0, 0)).unwrap();
        let fired: Vec<DateTime<Local>> = reminders(&[schedule], &range)
            .into_iter()
            .map(|r| r.fire_at)
            .collect();
        assert_eq!(fired, vec![at(7, 9, 14, 0), at(7, 10, 13, 45)]);
    }

    #[test]
    fn test_all_day_alarm_at_nine() {
        let schedule = Schedule::builder()
            .type_id(1)
            .title("Birthday")
            .start(at(7, 10, 0, 0))
            .all_day(true)
            .alarm(Alarm::SameDayAt9)
            .alarm(Alarm::DayBeforeAt9)
            .build()
            .unwrap();

        let range = DateRange::new(at(7, 1, 0, 0), at(8, 1, 0, 0)).unwrap();
        let fired: Vec<DateTime<Local>> = reminders(&[schedule], &range)
            .into_iter()
            .map(|r| r.fire_at)
            .collect();
        assert_eq!(fired, vec![at(7, 9, 9, 0), at(7, 10, 9, 0)]);
    }

    #[test]
    fn test_week_ahead_alarm_for_later_occurrence() {
        // The occurrence is outside the window but its week-ahead alarm is not.
        let schedule = Schedule::builder()
            .type_id(1)
            .title("Rent")
            .start(at(8, 3, 10, 0))
            .repeat(RecurrenceKind::Monthly)
            .alarm(Alarm::Week1Before)
            .build()
            .unwrap();

        let range = DateRange::new(at(7, 20, 0, 0), at(8, 1, 0, 0)).unwrap();
        let found = reminders(&[schedule], &range);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].occurrence_start, at(8, 3, 10, 0));
        assert_eq!(found[0].fire_at, at(7, 27, 10, 0));
    }

    #[test]
    fn test_schedules_without_alarms_are_silent() {
        let schedule = Schedule::new(1, "Quiet", at(7, 10, 9, 0), at(7, 10, 10, 0)).unwrap();
        let range = DateRange::new(at(7, 1, 0, 0), at(8, 1, 0, 0)).unwrap();
        assert!(reminders(&[schedule], &range).is_empty());
    }
}
