//! Chinese lunisolar calendar.
//!
//! Months start on the local (UTC+8) day of a new moon. The month holding
//! the winter solstice is month 11; a year with 13 new moons between two
//! such months repeats the first month that contains no principal solar
//! term as a leap month. Supported for years 1900 through 2100.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

pub mod astronomy;
mod names;

pub use names::{day_info, LunarDayInfo};

use astronomy::{
    date_from_julian_day_number, julian_day_number, lunation_before, new_moon_day, sun_sector,
};

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

/// A date in the lunisolar calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LunarDate {
    pub year: i32,
    pub month: u32,
    pub leap: bool,
    pub day: u32,
}

/// One lunar month: its label, first solar day and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LunarMonth {
    pub year: i32,
    pub month: u32,
    pub leap: bool,
    pub start: NaiveDate,
    pub days: u32,
    #[serde(skip)]
    lunation: i64,
}

impl LunarMonth {
    /// Solar date of day `day` of this month, clamped to the month length.
    pub fn day_clamped(&self, day: u32) -> Option<NaiveDate> {
        let offset = day.clamp(1, self.days) - 1;
        self.start.checked_add_days(chrono::Days::new(offset as u64))
    }

    fn from_lunation(lunation: i64) -> Option<Self> {
        let start_day = new_moon_day(lunation);
        let next_day = new_moon_day(lunation + 1);
        let start = date_from_julian_day_number(start_day)?;
        let label = solar_to_lunar(start)?;
        Some(Self {
            year: label.year,
            month: label.month,
            leap: label.leap,
            start,
            days: u32::try_from(next_day - start_day).ok()?,
            lunation,
        })
    }
}

/// Month 11 of a solar year: its lunation number and first day number.
#[derive(Clone, Copy)]
struct Month11 {
    lunation: i64,
    day: i64,
}

fn month_11(year: i32) -> Option<Month11> {
    let dec31 = julian_day_number(NaiveDate::from_ymd_opt(year, 12, 31)?);
    let mut k = lunation_before(dec31 as f64);
    if new_moon_day(k) > dec31 {
        k -= 1;
    }
    if sun_sector(new_moon_day(k)) >= 9 {
        k -= 1;
    }
    Some(Month11 {
        lunation: k,
        day: new_moon_day(k),
    })
}

/// Offset from month 11 of the first month without a principal term.
fn leap_offset(month_11: Month11) -> i64 {
    let k = month_11.lunation;
    let mut i = 1;
    let mut arc = sun_sector(new_moon_day(k + i));
    loop {
        let last = arc;
        i += 1;
        arc = sun_sector(new_moon_day(k + i));
        if arc == last || i >= 14 {
            break;
        }
    }
    i - 1
}

fn has_leap(a: Month11, b: Month11) -> bool {
    b.lunation - a.lunation == 13
}

/// Month number the leap month at `offset` (from month 11) repeats.
fn leap_month_number(offset: i64) -> u32 {
    ((offset + 9).rem_euclid(12) + 1) as u32
}

/// Lunation number of the month whose first day is at or before `day_number`.
fn lunation_containing(day_number: i64) -> i64 {
    let mut k = lunation_before(day_number as f64) + 1;
    while new_moon_day(k) > day_number {
        k -= 1;
    }
    k
}

fn in_supported_range(year: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

/// Convert a Gregorian date to its lunar date.
pub fn solar_to_lunar(date: NaiveDate) -> Option<LunarDate> {
    if !in_supported_range(date.year()) {
        return None;
    }

    let day_number = julian_day_number(date);
    let k = lunation_containing(day_number);
    let month_start = new_moon_day(k);

    let this_11 = month_11(date.year())?;
    let (mut year, a11, b11) = if this_11.day >= month_start {
        (date.year(), month_11(date.year() - 1)?, this_11)
    } else {
        (date.year() + 1, this_11, month_11(date.year() + 1)?)
    };

    let diff = k - a11.lunation;
    let mut month = diff + 11;
    let mut leap = false;
    if has_leap(a11, b11) {
        let offset = leap_offset(a11);
        if diff >= offset {
            month = diff + 10;
            leap = diff == offset;
        }
    }
    if month > 12 {
        month -= 12;
    }
    if month >= 11 && diff < 4 {
        year -= 1;
    }

    Some(LunarDate {
        year,
        month: month as u32,
        leap,
        day: u32::try_from(day_number - month_start + 1).ok()?,
    })
}

/// Lunation number of a labelled lunar month, if that month exists.
fn locate_month(year: i32, month: u32, leap: bool) -> Option<i64> {
    if !in_supported_range(year) || !(1..=12).contains(&month) {
        return None;
    }

    let (a11, b11) = if month < 11 {
        (month_11(year - 1)?, month_11(year)?)
    } else {
        (month_11(year)?, month_11(year + 1)?)
    };

    let mut offset = (month as i64 - 11).rem_euclid(12);
    if has_leap(a11, b11) {
        let leap_off = leap_offset(a11);
        if leap && month != leap_month_number(leap_off) {
            return None;
        }
        if leap || offset >= leap_off {
            offset += 1;
        }
    } else if leap {
        return None;
    }

    Some(a11.lunation + offset)
}

/// Convert a lunar date to its Gregorian date. `None` if the month does
/// not exist (e.g. a leap month in a year without one) or the day exceeds
/// the month's length.
pub fn lunar_to_solar(year: i32, month: u32, leap: bool, day: u32) -> Option<NaiveDate> {
    let lunar_month = lunar_month(year, month, leap)?;
    if day == 0 || day > lunar_month.days {
        return None;
    }
    lunar_month.day_clamped(day)
}

/// The lunar month with the given label.
pub fn lunar_month(year: i32, month: u32, leap: bool) -> Option<LunarMonth> {
    let k = locate_month(year, month, leap)?;
    let start_day = new_moon_day(k);
    Some(LunarMonth {
        year,
        month,
        leap,
        start: date_from_julian_day_number(start_day)?,
        days: u32::try_from(new_moon_day(k + 1) - start_day).ok()?,
        lunation: k,
    })
}

/// Number of days (29 or 30) in a lunar month.
pub fn month_days(year: i32, month: u32, leap: bool) -> Option<u32> {
    lunar_month(year, month, leap).map(|m| m.days)
}

/// Leap month number of a lunar year, if it has one.
pub fn leap_month(year: i32) -> Option<u32> {
    let leap_between = |from: i32| -> Option<u32> {
        let a = month_11(from)?;
        let b = month_11(from + 1)?;
        has_leap(a, b).then(|| leap_month_number(leap_offset(a)))
    };

    leap_between(year - 1)
        .filter(|m| *m < 11)
        .or_else(|| leap_between(year).filter(|m| *m >= 11))
}

/// The lunar month containing a solar date.
pub fn month_containing(date: NaiveDate) -> Option<LunarMonth> {
    if !in_supported_range(date.year()) {
        return None;
    }
    LunarMonth::from_lunation(lunation_containing(julian_day_number(date)))
}

/// Consecutive lunar months (leap months included) starting with the month
/// that contains `date`. Ends at the edge of the supported range.
pub fn months_from(date: NaiveDate) -> LunarMonths {
    LunarMonths {
        next: month_containing(date).map(|m| m.lunation),
    }
}

/// Iterator over consecutive lunar months.
pub struct LunarMonths {
    next: Option<i64>,
}

impl Iterator for LunarMonths {
    type Item = LunarMonth;

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.next?;
        match LunarMonth::from_lunation(k) {
            Some(month) => {
                self.next = Some(k + 1);
                Some(month)
            }
            None => {
                self.next = None;
                None
            }
        }
    }
}
