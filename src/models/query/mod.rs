//! Query parameters and date windows.

use chrono::{DateTime, Local, Months};

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::recurrence::RecurrenceKind;

mod wire;

pub use wire::QueryParamsRecord;

/// Half-open window `[start, end)` of local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl DateRange {
    pub fn new(start: DateTime<Local>, end: DateTime<Local>) -> ScheduleResult<Self> {
        if end < start {
            return Err(ScheduleError::InvalidRange(format!(
                "window ends ({}) before it starts ({})",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// `months` either side of `now`, the default keyword-search window.
    pub fn around(now: DateTime<Local>, months: u32) -> ScheduleResult<Self> {
        let span = Months::new(months);
        let start = now
            .checked_sub_months(span)
            .ok_or_else(|| ScheduleError::InvalidRange("search window underflows".into()))?;
        let end = now
            .checked_add_months(span)
            .ok_or_else(|| ScheduleError::InvalidRange("search window overflows".into()))?;
        Self::new(start, end)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, instant: DateTime<Local>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Whether an interval from `start` to `end` touches the window.
    /// Zero-length intervals count when their instant lies inside it.
    pub fn intersects(&self, start: DateTime<Local>, end: DateTime<Local>) -> bool {
        start < self.end && (end > self.start || start >= self.start)
    }
}

/// Extra narrowing applied after the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFilter {
    All,
    /// Keep only the first `n` occurrences in time order
    Top(usize),
    /// Keep only schedules of one recurrence kind
    Kind(RecurrenceKind),
}

/// A date-range query with optional keyword and filter.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub keyword: Option<String>,
    pub filter: QueryFilter,
}

impl QueryParams {
    pub fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self {
            start,
            end,
            keyword: None,
            filter: QueryFilter::All,
        }
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        self.keyword = (!keyword.trim().is_empty()).then_some(keyword);
        self
    }

    pub fn top(mut self, n: usize) -> Self {
        self.filter = QueryFilter::Top(n);
        self
    }

    pub fn kind(mut self, kind: RecurrenceKind) -> Self {
        self.filter = QueryFilter::Kind(kind);
        self
    }

    pub fn range(&self) -> ScheduleResult<DateRange> {
        DateRange::new(self.start, self.end)
    }

    pub fn to_json(&self) -> ScheduleResult<String> {
        Ok(serde_json::to_string(&QueryParamsRecord::from(self))?)
    }

    pub fn from_json(json: &str) -> ScheduleResult<Self> {
        let record: QueryParamsRecord = serde_json::from_str(json)?;
        record.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(matches!(
            DateRange::new(at(2, 0), at(1, 0)),
            Err(ScheduleError::InvalidRange(_))
        ));
        assert!(DateRange::new(at(1, 0), at(1, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_half_open_intersection() {
        let window = DateRange::new(at(2, 0), at(3, 0)).unwrap();
        assert!(window.intersects(at(1, 20), at(2, 1)));
        assert!(!window.intersects(at(1, 20), at(2, 0)));
        assert!(!window.intersects(at(3, 0), at(3, 1)));
        assert!(window.intersects(at(2, 0), at(2, 0)));
        assert!(!window.intersects(at(3, 0), at(3, 0)));
    }

    #[test]
    fn test_around_is_symmetric() {
        let now = at(15, 12);
        let window = DateRange::around(now, 6).unwrap();
        assert_eq!(window.start, Local.with_ymd_and_hms(2023, 11, 15, 12, 0, 0).unwrap());
        assert_eq!(window.end, Local.with_ymd_and_hms(2024, 11, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_blank_keyword_is_dropped() {
        let params = QueryParams::new(at(1, 0), at(2, 0)).keyword("  ");
        assert_eq!(params.keyword, None);
    }
}
