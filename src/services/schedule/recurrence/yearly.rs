use chrono::{Datelike, NaiveDate};

use crate::utils::date::add_months_clamped;

/// Date of instance `n` of a yearly series; Feb 29 falls back to Feb 28
/// in common years.
pub(super) fn nth_date(anchor: NaiveDate, n: u32) -> Option<NaiveDate> {
    add_months_clamped(anchor, n as i64 * 12)
}

/// Index of an instance no later than the year before `target`.
pub(super) fn index_before(anchor: NaiveDate, target: NaiveDate) -> u32 {
    let years = target.year() as i64 - anchor.year() as i64 - 1;
    u32::try_from(years.max(0)).unwrap_or(u32::MAX)
}
