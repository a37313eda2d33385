// Date utility functions
// Local-time resolution and calendar arithmetic shared by the engine

use chrono::{DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Weekday};

/// Map a wall-clock time to an instant in the local zone.
pub fn resolve_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    resolve_in(&Local, naive)
}

/// Map a wall-clock time to an instant in `tz`.
///
/// Ambiguous times (clocks going back) take the earlier instant whatever
/// order the zone reports them in; times that do not exist (clocks going
/// forward) are pushed one hour later.
pub fn resolve_in<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(a, b) => Some(if b < a { b } else { a }),
        LocalResult::None => match tz.from_local_datetime(&(naive + Duration::hours(1))) {
            LocalResult::Single(dt) => Some(dt),
            LocalResult::Ambiguous(a, b) => Some(if b < a { b } else { a }),
            LocalResult::None => None,
        },
    }
}

pub fn is_same_day(date1: DateTime<Local>, date2: DateTime<Local>) -> bool {
    date1.date_naive() == date2.date_naive()
}

/// First instant of a local calendar day.
pub fn start_of_day(date: NaiveDate) -> Option<DateTime<Local>> {
    resolve_local(date.and_hms_opt(0, 0, 0)?)
}

/// First instant of the day after `date`.
pub fn start_of_next_day(date: NaiveDate) -> Option<DateTime<Local>> {
    start_of_day(date.succ_opt()?)
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Move `months` calendar months from `date`, clamping the day to the last
/// valid day of the target month (Jan 31 + 1 month is Feb 28/29).
pub fn add_months_clamped(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let total = date.year() as i64 * 12 + date.month0() as i64 + months;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Every local date touched by the half-open interval `[start, end)`.
/// A zero-length interval touches its own date.
pub fn dates_between(start: DateTime<Local>, end: DateTime<Local>) -> impl Iterator<Item = NaiveDate> {
    let first = start.date_naive();
    let last = if end > start {
        (end - Duration::nanoseconds(1)).date_naive()
    } else {
        first
    };
    first.iter_days().take_while(move |d| *d <= last)
}
