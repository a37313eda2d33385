use chrono::{Days, NaiveDate};

/// Date of instance `n` of a weekly series.
pub(super) fn nth_date(anchor: NaiveDate, n: u32) -> Option<NaiveDate> {
    anchor.checked_add_days(Days::new(n as u64 * 7))
}

/// Index of the last weekly instance on or before `target`.
pub(super) fn index_on_or_before(anchor: NaiveDate, target: NaiveDate) -> u32 {
    u32::try_from((target - anchor).num_days().max(0) / 7).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_weekly_keeps_weekday() {
        let anchor = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        for n in 0..60 {
            assert_eq!(nth_date(anchor, n).unwrap().weekday(), anchor.weekday());
        }
    }

    #[test]
    fn test_weekly_index() {
        let anchor = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let target = NaiveDate::from_ymd_opt(2024, 1, 25).unwrap();
        let n = index_on_or_before(anchor, target);
        assert_eq!(n, 2);
        assert!(nth_date(anchor, n).unwrap() <= target);
        assert!(nth_date(anchor, n + 1).unwrap() > target);
    }
}
