//! Recurrence expansion.
//!
//! A schedule's series is walked lazily from its anchor. Each frequency
//! module computes the date of instance `n`; this module applies the end
//! bound and the exception set, then clips to the query window.

use chrono::{DateTime, Local, NaiveDate, NaiveTime};

use crate::models::query::DateRange;
use crate::models::recurrence::RecurrenceKind;
use crate::models::schedule::{Occurrence, Schedule};

mod daily;
mod lunar;
mod monthly;
mod utils;
mod weekly;
mod yearly;

enum Cadence {
    Once,
    Daily,
    Weekdays(daily::WeekdayCursor),
    Weekly,
    Monthly,
    Yearly,
    LunarMonthly(lunar::LunarMonthlyCursor),
    LunarYearly(lunar::LunarYearlyCursor),
}

impl Cadence {
    fn for_schedule(schedule: &Schedule) -> Self {
        let anchor = schedule.start.date_naive();
        match schedule.recurrence.kind {
            RecurrenceKind::None => Cadence::Once,
            RecurrenceKind::Daily => Cadence::Daily,
            RecurrenceKind::Weekdays => Cadence::Weekdays(daily::WeekdayCursor::new(anchor)),
            RecurrenceKind::Weekly => Cadence::Weekly,
            RecurrenceKind::Monthly => Cadence::Monthly,
            RecurrenceKind::Yearly => Cadence::Yearly,
            RecurrenceKind::LunarMonthly => {
                Cadence::LunarMonthly(lunar::LunarMonthlyCursor::new(anchor))
            }
            RecurrenceKind::LunarYearly => {
                Cadence::LunarYearly(lunar::LunarYearlyCursor::new(anchor))
            }
        }
    }

    /// Date of instance `n`. Cursor-backed cadences expect `n` to grow by
    /// one per call.
    fn date_at(&mut self, anchor: NaiveDate, n: u32) -> Option<NaiveDate> {
        if n == 0 {
            return Some(anchor);
        }

        match self {
            Cadence::Once => None,
            Cadence::Daily => daily::nth_date(anchor, n),
            Cadence::Weekdays(cursor) => cursor.next_date(),
            Cadence::Weekly => weekly::nth_date(anchor, n),
            Cadence::Monthly => monthly::nth_date(anchor, n),
            Cadence::Yearly => yearly::nth_date(anchor, n),
            Cadence::LunarMonthly(cursor) => cursor.next_date(),
            Cadence::LunarYearly(cursor) => cursor.nth_date(n),
        }
    }

    /// Index of an instance dated no later than `target`, so that walking
    /// from it misses nothing on or after `target`.
    fn seek(&mut self, anchor: NaiveDate, target: NaiveDate) -> u32 {
        if target <= anchor {
            return 0;
        }

        match self {
            Cadence::Once | Cadence::LunarMonthly(_) => 0,
            Cadence::Daily => daily::index_on_or_after(anchor, target),
            Cadence::Weekdays(cursor) => match target.pred_opt() {
                Some(before) if before > anchor => cursor.seek(anchor, before).saturating_add(1),
                _ => 0,
            },
            Cadence::Weekly => weekly::index_on_or_before(anchor, target),
            Cadence::Monthly => monthly::index_before(anchor, target),
            Cadence::Yearly => yearly::index_before(anchor, target),
            Cadence::LunarYearly(cursor) => cursor.index_before(target),
        }
    }
}

/// Start instants of a series in time order, paired with their 1-based
/// sequence numbers. Honors the end bound and skips exceptions; excluded
/// instances still consume a sequence number.
pub struct Instances<'a> {
    schedule: &'a Schedule,
    cadence: Cadence,
    anchor: NaiveDate,
    time: NaiveTime,
    next_index: u32,
    done: bool,
}

impl<'a> Instances<'a> {
    pub fn new(schedule: &'a Schedule) -> Self {
        Self {
            schedule,
            cadence: Cadence::for_schedule(schedule),
            anchor: schedule.start.date_naive(),
            time: schedule.start.time(),
            next_index: 0,
            done: false,
        }
    }

    /// Jump close to `target` without walking every earlier instance.
    /// Has no effect once iteration has started.
    pub fn skip_to(&mut self, target: NaiveDate) {
        if self.next_index == 0 {
            self.next_index = self.cadence.seek(self.anchor, target);
        }
    }
}

impl Iterator for Instances<'_> {
    type Item = (u32, DateTime<Local>);

    fn next(&mut self) -> Option<Self::Item> {
        let rule = &self.schedule.recurrence;

        while !self.done {
            let n = self.next_index;
            if rule.max_count().is_some_and(|max| n >= max) || n == u32::MAX {
                self.done = true;
                break;
            }

            let Some(date) = self.cadence.date_at(self.anchor, n) else {
                self.done = true;
                break;
            };
            self.next_index = n + 1;

            let start = if n == 0 {
                Some(self.schedule.start)
            } else {
                utils::instance_start(date, self.time)
            };
            let Some(start) = start else {
                continue;
            };

            if rule.end_date().is_some_and(|until| start > until) {
                self.done = true;
                break;
            }

            if rule.is_excluded(start) {
                continue;
            }

            return Some((n + 1, start));
        }

        None
    }
}

/// Every occurrence of a schedule, lazily. Unbounded rules never end, so
/// callers must limit the walk.
pub fn occurrences(schedule: &Schedule) -> impl Iterator<Item = Occurrence> + '_ {
    let duration = schedule.duration();
    Instances::new(schedule)
        .map(move |(sequence, start)| utils::materialize(schedule, start, duration, sequence))
}

/// Occurrences starting at or after `from`, lazily.
pub fn occurrences_from(
    schedule: &Schedule,
    from: DateTime<Local>,
) -> impl Iterator<Item = Occurrence> + '_ {
    let duration = schedule.duration();
    let mut instances = Instances::new(schedule);
    if let Some(target) = from.date_naive().pred_opt() {
        instances.skip_to(target);
    }

    instances
        .skip_while(move |(_, start)| *start < from)
        .map(move |(sequence, start)| utils::materialize(schedule, start, duration, sequence))
}

/// Occurrences of a schedule that intersect the half-open window.
pub fn expand(schedule: &Schedule, range: &DateRange) -> Vec<Occurrence> {
    let duration = schedule.duration();
    let mut instances = Instances::new(schedule);

    let earliest_relevant = range
        .start
        .checked_sub_signed(duration)
        .and_then(|t| t.date_naive().pred_opt());
    if let Some(target) = earliest_relevant {
        instances.skip_to(target);
    }

    let found: Vec<Occurrence> = instances
        .map(|(sequence, start)| {
            let span = utils::instance_span(schedule, start, duration);
            (sequence, start, span)
        })
        .take_while(|(_, _, (from, _))| *from < range.end)
        .filter(|(_, _, (from, to))| range.intersects(*from, *to))
        .map(|(sequence, start, _)| utils::materialize(schedule, start, duration, sequence))
        .collect();

    log::debug!(
        "Expanded schedule {:?} ({}) to {} occurrence(s)",
        schedule.id,
        schedule.recurrence.kind,
        found.len()
    );

    found
}

/// Occurrences of many schedules in the window, ordered by start, then
/// schedule id, then sequence.
pub fn expand_all(schedules: &[Schedule], range: &DateRange) -> Vec<Occurrence> {
    let mut all: Vec<Occurrence> = schedules
        .iter()
        .flat_map(|schedule| expand(schedule, range))
        .collect();
    all.sort_by(|a, b| {
        a.start()
            .cmp(&b.start())
            .then(a.schedule_id().cmp(&b.schedule_id()))
            .then(a.sequence.cmp(&b.sequence))
    });
    all
}
