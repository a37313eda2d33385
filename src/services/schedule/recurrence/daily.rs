use chrono::{Days, NaiveDate};

use crate::utils::date::is_weekend;

/// Date of instance `n` of a daily series.
pub(super) fn nth_date(anchor: NaiveDate, n: u32) -> Option<NaiveDate> {
    anchor.checked_add_days(Days::new(n as u64))
}

/// Index of the first daily instance on or after `target`.
pub(super) fn index_on_or_after(anchor: NaiveDate, target: NaiveDate) -> u32 {
    u32::try_from((target - anchor).num_days().max(0)).unwrap_or(u32::MAX)
}

/// Walks Monday-to-Friday dates after the anchor.
#[derive(Debug, Clone)]
pub(super) struct WeekdayCursor {
    last: NaiveDate,
}

impl WeekdayCursor {
    pub(super) fn new(anchor: NaiveDate) -> Self {
        Self { last: anchor }
    }

    pub(super) fn next_date(&mut self) -> Option<NaiveDate> {
        let mut date = self.last.succ_opt()?;
        while is_weekend(date) {
            date = date.succ_opt()?;
        }
        self.last = date;
        Some(date)
    }

    /// Position the cursor so the next date is the first weekday after
    /// `target`. Returns how many weekdays fall in `(anchor, target]`.
    pub(super) fn seek(&mut self, anchor: NaiveDate, target: NaiveDate) -> u32 {
        if target <= anchor {
            return 0;
        }

        // Any seven consecutive days hold exactly five weekdays.
        let weeks = (target - anchor).num_days() / 7;
        let mut count = weeks * 5;
        let mut date = anchor + chrono::Duration::days(weeks * 7);
        while date < target {
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
            if !is_weekend(date) {
                count += 1;
            }
        }

        self.last = target;
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}
