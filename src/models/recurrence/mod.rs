//! Recurrence rule model.
//!
//! A rule is a kind (how the series advances), an end bound (never, until a
//! date-time, or a number of instances) and a set of exception date-times.
//! Rules persist as RRULE strings; exceptions persist separately.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ScheduleError, ScheduleResult};

mod parser;

pub use parser::{format_rrule, parse_rrule};

/// How a recurring series advances from one instance to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecurrenceKind {
    None,
    Daily,
    /// Every day except Saturday and Sunday
    Weekdays,
    Weekly,
    Monthly,
    Yearly,
    LunarMonthly,
    LunarYearly,
}

impl RecurrenceKind {
    pub const ALL: [RecurrenceKind; 8] = [
        RecurrenceKind::None,
        RecurrenceKind::Daily,
        RecurrenceKind::Weekdays,
        RecurrenceKind::Weekly,
        RecurrenceKind::Monthly,
        RecurrenceKind::Yearly,
        RecurrenceKind::LunarMonthly,
        RecurrenceKind::LunarYearly,
    ];

    pub fn is_recurring(self) -> bool {
        self != RecurrenceKind::None
    }

    pub fn is_lunar(self) -> bool {
        matches!(self, RecurrenceKind::LunarMonthly | RecurrenceKind::LunarYearly)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecurrenceKind::None => "none",
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekdays => "weekdays",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Monthly => "monthly",
            RecurrenceKind::Yearly => "yearly",
            RecurrenceKind::LunarMonthly => "lunar-monthly",
            RecurrenceKind::LunarYearly => "lunar-yearly",
        }
    }

    /// Stable numeric code used by the JSON query wire form.
    pub fn code(self) -> u8 {
        match self {
            RecurrenceKind::None => 0,
            RecurrenceKind::Daily => 1,
            RecurrenceKind::Weekdays => 2,
            RecurrenceKind::Weekly => 3,
            RecurrenceKind::Monthly => 4,
            RecurrenceKind::Yearly => 5,
            RecurrenceKind::LunarMonthly => 6,
            RecurrenceKind::LunarYearly => 7,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ScheduleError::InvalidRecurrence(format!("unknown kind '{}'", s)))
    }
}

/// Where a recurring series stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrenceEnd {
    /// Bounded only by the query window
    Never,
    /// Instances starting after this instant are excluded
    Until(DateTime<Local>),
    /// Instances 1..=n, the anchor being instance 1
    Count(u32),
}

/// A recurrence kind with its end bound and exception set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub kind: RecurrenceKind,
    pub end: RecurrenceEnd,
    exceptions: Vec<DateTime<Local>>,
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self::none()
    }
}

impl RecurrenceRule {
    /// A non-recurring rule.
    pub fn none() -> Self {
        Self::new(RecurrenceKind::None)
    }

    /// An unbounded rule of the given kind.
    pub fn new(kind: RecurrenceKind) -> Self {
        Self {
            kind,
            end: RecurrenceEnd::Never,
            exceptions: Vec::new(),
        }
    }

    pub fn until(mut self, until: DateTime<Local>) -> Self {
        self.end = RecurrenceEnd::Until(until);
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.end = RecurrenceEnd::Count(count);
        self
    }

    pub fn with_exceptions(mut self, exceptions: impl IntoIterator<Item = DateTime<Local>>) -> Self {
        for exception in exceptions {
            self.add_exception(exception);
        }
        self
    }

    /// Build a rule from the integer duration encoding: negative is
    /// unbounded, zero ends at `until`, positive is an instance count.
    pub fn from_duration(
        kind: RecurrenceKind,
        duration: i32,
        until: Option<DateTime<Local>>,
    ) -> ScheduleResult<Self> {
        let rule = Self::new(kind);
        match duration {
            d if d < 0 => Ok(rule),
            0 => until.map(|dt| rule.until(dt)).ok_or_else(|| {
                ScheduleError::InvalidRecurrence("duration 0 requires an end date".into())
            }),
            d => Ok(rule.count(d as u32)),
        }
    }

    /// The integer duration encoding of the end bound.
    pub fn duration(&self) -> i32 {
        match self.end {
            RecurrenceEnd::Never => -1,
            RecurrenceEnd::Until(_) => 0,
            RecurrenceEnd::Count(n) => i32::try_from(n).unwrap_or(i32::MAX),
        }
    }

    pub fn end_date(&self) -> Option<DateTime<Local>> {
        match self.end {
            RecurrenceEnd::Until(until) => Some(until),
            _ => None,
        }
    }

    pub fn max_count(&self) -> Option<u32> {
        match self.end {
            RecurrenceEnd::Count(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.kind.is_recurring()
    }

    /// Exception date-times, sorted and without duplicates.
    pub fn exceptions(&self) -> &[DateTime<Local>] {
        &self.exceptions
    }

    /// Add an exception; returns false if it was already present.
    pub fn add_exception(&mut self, exception: DateTime<Local>) -> bool {
        match self.exceptions.binary_search(&exception) {
            Ok(_) => false,
            Err(pos) => {
                self.exceptions.insert(pos, exception);
                true
            }
        }
    }

    pub fn remove_exception(&mut self, exception: &DateTime<Local>) -> bool {
        match self.exceptions.binary_search(exception) {
            Ok(pos) => {
                self.exceptions.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// An instance is excluded when an exception falls on its local date.
    pub fn is_excluded(&self, instance_start: DateTime<Local>) -> bool {
        let date = instance_start.date_naive();
        self.exceptions.iter().any(|ex| ex.date_naive() == date)
    }

    /// Check the rule against the schedule's calendar system.
    pub fn validate(&self, lunar: bool) -> ScheduleResult<()> {
        if !self.kind.is_recurring() && self.end != RecurrenceEnd::Never {
            return Err(ScheduleError::InvalidRecurrence(
                "a non-recurring schedule cannot carry an end bound".into(),
            ));
        }

        if self.end == RecurrenceEnd::Count(0) {
            return Err(ScheduleError::InvalidRecurrence(
                "count must be at least 1".into(),
            ));
        }

        if self.kind.is_lunar() && !lunar {
            return Err(ScheduleError::InvalidRecurrence(format!(
                "{} requires a lunar schedule",
                self.kind
            )));
        }

        if lunar && matches!(self.kind, RecurrenceKind::Monthly | RecurrenceKind::Yearly) {
            return Err(ScheduleError::InvalidRecurrence(format!(
                "{} is a solar rule; use the lunar variant for lunar schedules",
                self.kind
            )));
        }

        Ok(())
    }

    /// RRULE text for storage; `None` for non-recurring rules.
    pub fn to_rrule(&self) -> Option<String> {
        format_rrule(self)
    }

    /// Rebuild a rule from stored RRULE text. The lunar flag selects the
    /// lunar variants of `FREQ=MONTHLY` and `FREQ=YEARLY`.
    pub fn from_rrule(
        rrule: Option<&str>,
        lunar: bool,
        exceptions: Vec<DateTime<Local>>,
    ) -> ScheduleResult<Self> {
        let rule = match rrule.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => parse_rrule(text, lunar)?,
            None => Self::none(),
        };
        Ok(rule.with_exceptions(exceptions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    #[test_case(-1, RecurrenceEnd::Never ; "negative is unbounded")]
    #[test_case(3, RecurrenceEnd::Count(3) ; "positive is a count")]
    fn test_from_duration(duration: i32, expected: RecurrenceEnd) {
        let rule = RecurrenceRule::from_duration(RecurrenceKind::Daily, duration, None).unwrap();
        assert_eq!(rule.end, expected);
        assert_eq!(rule.duration(), duration);
    }

    #[test]
    fn test_zero_duration_needs_end_date() {
        let err = RecurrenceRule::from_duration(RecurrenceKind::Weekly, 0, None).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidRecurrence(_)));

        let until = at(2024, 5, 1);
        let rule = RecurrenceRule::from_duration(RecurrenceKind::Weekly, 0, Some(until)).unwrap();
        assert_eq!(rule.end_date(), Some(until));
        assert_eq!(rule.duration(), 0);
    }

    #[test]
    fn test_exceptions_are_sorted_and_unique() {
        let mut rule = RecurrenceRule::new(RecurrenceKind::Daily);
        assert!(rule.add_exception(at(2024, 3, 5)));
        assert!(rule.add_exception(at(2024, 3, 1)));
        assert!(!rule.add_exception(at(2024, 3, 5)));
        assert_eq!(rule.exceptions(), &[at(2024, 3, 1), at(2024, 3, 5)]);

        assert!(rule.remove_exception(&at(2024, 3, 1)));
        assert_eq!(rule.exceptions().len(), 1);
    }

    #[test]
    fn test_exception_matches_local_date() {
        let rule = RecurrenceRule::new(RecurrenceKind::Daily).with_exceptions([at(2024, 3, 5)]);
        let same_day_other_time = Local.with_ymd_and_hms(2024, 3, 5, 18, 30, 0).unwrap();
        assert!(rule.is_excluded(same_day_other_time));
        assert!(!rule.is_excluded(at(2024, 3, 6)));
    }

    #[test_case(RecurrenceKind::LunarMonthly, false, false ; "lunar kind on solar schedule")]
    #[test_case(RecurrenceKind::Monthly, true, false ; "solar monthly on lunar schedule")]
    #[test_case(RecurrenceKind::LunarYearly, true, true ; "lunar yearly on lunar schedule")]
    #[test_case(RecurrenceKind::Weekly, true, true ; "weekly on lunar schedule")]
    fn test_validate_calendar_system(kind: RecurrenceKind, lunar: bool, ok: bool) {
        assert_eq!(RecurrenceRule::new(kind).validate(lunar).is_ok(), ok);
    }

    #[test]
    fn test_non_recurring_rejects_bounds() {
        let rule = RecurrenceRule::none().count(2);
        assert!(rule.validate(false).is_err());
        assert!(RecurrenceRule::new(RecurrenceKind::Daily).count(0).validate(false).is_err());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Lunar_Yearly".parse::<RecurrenceKind>().unwrap(), RecurrenceKind::LunarYearly);
        assert!("fortnightly".parse::<RecurrenceKind>().is_err());
        for kind in RecurrenceKind::ALL {
            assert_eq!(RecurrenceKind::from_code(kind.code()), Some(kind));
        }
    }
}
