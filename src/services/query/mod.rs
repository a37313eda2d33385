//! Query and aggregation over materialized occurrences.
//!
//! Everything here is a pure function of the schedules passed in. Rules are
//! always expanded first, so splitting a window in two and querying each
//! half gives the same occurrences as querying the whole.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate};

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::query::{DateRange, QueryFilter, QueryParams};
use crate::models::schedule::{Occurrence, Schedule};
use crate::services::schedule::recurrence::{expand, occurrences_from};
use crate::utils::date::{dates_between, start_of_day, start_of_next_day};

/// Occurrences grouped by the local dates they touch.
pub type ScheduleMap = BTreeMap<NaiveDate, Vec<Occurrence>>;

/// Group every occurrence in the window under each local date it
/// intersects, clipped to the window.
pub fn schedule_map(schedules: &[Schedule], range: &DateRange) -> ScheduleMap {
    let found = collect(schedules.iter(), range);
    group_by_day(found, range)
}

/// Occurrences touching one local date.
pub fn day(schedules: &[Schedule], date: NaiveDate) -> ScheduleResult<Vec<Occurrence>> {
    let range = day_range(date)?;
    Ok(schedule_map(schedules, &range)
        .remove(&date)
        .unwrap_or_default())
}

/// Range query with optional keyword and filter.
///
/// `Top(n)` keeps the first `n` occurrences in time order before grouping.
pub fn query(schedules: &[Schedule], params: &QueryParams) -> ScheduleResult<ScheduleMap> {
    let range = params.range()?;
    let keyword = params.keyword.as_deref().unwrap_or("");

    let selected = schedules.iter().filter(|schedule| {
        let kind_matches = match params.filter {
            QueryFilter::Kind(kind) => schedule.recurrence.kind == kind,
            QueryFilter::All | QueryFilter::Top(_) => true,
        };
        kind_matches && schedule.matches_keyword(keyword)
    });

    let mut found = collect(selected, &range);
    if let QueryFilter::Top(n) = params.filter {
        found.truncate(n);
    }

    log::debug!(
        "Query {} to {} matched {} occurrence(s)",
        range.start,
        range.end,
        found.len()
    );
    Ok(group_by_day(found, &range))
}

/// Case-insensitive keyword search across title, description and location.
/// A blank keyword finds nothing.
pub fn search(schedules: &[Schedule], keyword: &str, range: &DateRange) -> ScheduleMap {
    if keyword.trim().is_empty() {
        return ScheduleMap::new();
    }

    let selected = schedules
        .iter()
        .filter(|schedule| schedule.matches_keyword(keyword));
    group_by_day(collect(selected, range), range)
}

/// The earliest `n` occurrences starting at or after `from`.
pub fn upcoming(schedules: &[Schedule], from: DateTime<Local>, n: usize) -> Vec<Occurrence> {
    if n == 0 {
        return Vec::new();
    }

    let mut found: Vec<Occurrence> = schedules
        .iter()
        .flat_map(|schedule| occurrences_from(schedule, from).take(n))
        .collect();

    found.sort_by(by_start);
    found.truncate(n);
    found
}

/// Serialize a schedule map as `{ "YYYY-MM-DD": [occurrence, ...] }`.
pub fn map_to_json(map: &ScheduleMap) -> ScheduleResult<String> {
    Ok(serde_json::to_string_pretty(map)?)
}

/// The whole local day containing `date`.
pub fn day_range(date: NaiveDate) -> ScheduleResult<DateRange> {
    let start = start_of_day(date);
    let end = start_of_next_day(date);
    match (start, end) {
        (Some(start), Some(end)) => DateRange::new(start, end),
        _ => Err(ScheduleError::InvalidRange(format!(
            "{} has no representable local day",
            date
        ))),
    }
}

fn collect<'a>(schedules: impl Iterator<Item = &'a Schedule>, range: &DateRange) -> Vec<Occurrence> {
    let mut found: Vec<Occurrence> = schedules
        .flat_map(|schedule| expand(schedule, range))
        .collect();
    found.sort_by(by_start);
    found
}

fn group_by_day(found: Vec<Occurrence>, range: &DateRange) -> ScheduleMap {
    let mut map = ScheduleMap::new();

    for occurrence in found {
        let (from, to) = occurrence.span();
        let from = from.max(range.start);
        let to = to.min(range.end);
        for date in dates_between(from, to) {
            map.entry(date).or_default().push(occurrence.clone());
        }
    }

    for list in map.values_mut() {
        list.sort_by(within_day);
    }
    map
}

fn by_start(a: &Occurrence, b: &Occurrence) -> Ordering {
    a.start()
        .cmp(&b.start())
        .then(a.schedule_id().cmp(&b.schedule_id()))
        .then(a.sequence.cmp(&b.sequence))
}

// All-day entries lead each day.
fn within_day(a: &Occurrence, b: &Occurrence) -> Ordering {
    b.schedule
        .all_day
        .cmp(&a.schedule.all_day)
        .then(a.start().cmp(&b.start()))
        .then(a.schedule_id().cmp(&b.schedule_id()))
        .then_with(|| a.schedule.title.cmp(&b.schedule.title))
}
