use chrono::NaiveDate;

use crate::utils::lunar::{self, LunarDate, LunarMonths};

/// Walks lunar months (leap months included) keeping the anchor's day,
/// clamped to shorter months.
pub(super) struct LunarMonthlyCursor {
    months: Option<LunarMonths>,
    day: u32,
}

impl LunarMonthlyCursor {
    pub(super) fn new(anchor: NaiveDate) -> Self {
        match lunar::solar_to_lunar(anchor) {
            Some(date) => {
                let mut months = lunar::months_from(anchor);
                // The anchor's own month is instance 0.
                months.next();
                Self {
                    months: Some(months),
                    day: date.day,
                }
            }
            None => {
                log::warn!("{} is outside the lunar calendar range", anchor);
                Self { months: None, day: 1 }
            }
        }
    }

    pub(super) fn next_date(&mut self) -> Option<NaiveDate> {
        let month = self.months.as_mut()?.next()?;
        month.day_clamped(self.day)
    }
}

/// Lunar anniversaries: the anchor's month and day in later lunar years.
/// A leap-month anchor recurs in the regular month of the same number.
pub(super) struct LunarYearlyCursor {
    anchor: Option<LunarDate>,
}

impl LunarYearlyCursor {
    pub(super) fn new(anchor: NaiveDate) -> Self {
        let lunar_anchor = lunar::solar_to_lunar(anchor);
        if lunar_anchor.is_none() {
            log::warn!("{} is outside the lunar calendar range", anchor);
        }
        Self { anchor: lunar_anchor }
    }

    pub(super) fn nth_date(&self, n: u32) -> Option<NaiveDate> {
        let anchor = self.anchor?;
        let year = anchor.year.checked_add(i32::try_from(n).ok()?)?;
        lunar::lunar_month(year, anchor.month, false)?.day_clamped(anchor.day)
    }

    /// Index of an instance no later than the lunar year before `target`.
    pub(super) fn index_before(&self, target: NaiveDate) -> u32 {
        let (Some(anchor), Some(target)) = (self.anchor, lunar::solar_to_lunar(target)) else {
            return 0;
        };
        u32::try_from((target.year - anchor.year - 1).max(0)).unwrap_or(0)
    }
}
