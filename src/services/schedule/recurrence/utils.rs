use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime};

use crate::models::schedule::{Occurrence, Schedule};
use crate::utils::date::{resolve_local, start_of_day, start_of_next_day};

/// Start instant of an instance on `date` at the anchor's wall-clock time.
pub(super) fn instance_start(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Local>> {
    resolve_local(date.and_time(time))
}

/// Interval an instance occupies, widened to whole days for all-day schedules.
pub(super) fn instance_span(
    schedule: &Schedule,
    start: DateTime<Local>,
    duration: Duration,
) -> (DateTime<Local>, DateTime<Local>) {
    let end = start + duration;
    if !schedule.all_day {
        return (start, end);
    }

    let from = start_of_day(start.date_naive()).unwrap_or(start);
    let to = start_of_next_day(end.date_naive()).unwrap_or(end);
    (from, to)
}

pub(super) fn materialize(
    schedule: &Schedule,
    start: DateTime<Local>,
    duration: Duration,
    sequence: u32,
) -> Occurrence {
    let mut instance = schedule.clone();
    instance.start = start;
    instance.end = start + duration;

    Occurrence {
        schedule: instance,
        sequence,
        recurrence_id: (sequence > 1).then_some(start),
    }
}
