use chrono::{Datelike, NaiveDate};

use crate::utils::date::add_months_clamped;

/// Date of instance `n` of a monthly series. Always measured from the
/// anchor so a clamped February does not pull later months earlier.
pub(super) fn nth_date(anchor: NaiveDate, n: u32) -> Option<NaiveDate> {
    add_months_clamped(anchor, n as i64)
}

/// Index of an instance no later than the month before `target`.
pub(super) fn index_before(anchor: NaiveDate, target: NaiveDate) -> u32 {
    let months = (target.year() as i64 - anchor.year() as i64) * 12
        + (target.month() as i64 - anchor.month() as i64)
        - 1;
    u32::try_from(months.max(0)).unwrap_or(u32::MAX)
}
