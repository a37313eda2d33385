//! Alarm presets.
//!
//! Timed schedules use offsets before the start; all-day schedules use
//! fixed 09:00 reminders relative to the day's midnight.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// A reminder preset attached to a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Alarm {
    AtStart,
    Minutes15Before,
    Minutes30Before,
    Hour1Before,
    Day1Before,
    Days2Before,
    Week1Before,
    /// 09:00 on the day
    SameDayAt9,
    /// 09:00 the day before
    DayBeforeAt9,
    /// 09:00 two days before
    TwoDaysBeforeAt9,
    /// 09:00 one week before
    WeekBeforeAt9,
}

impl Alarm {
    pub const TIMED: [Alarm; 7] = [
        Alarm::AtStart,
        Alarm::Minutes15Before,
        Alarm::Minutes30Before,
        Alarm::Hour1Before,
        Alarm::Day1Before,
        Alarm::Days2Before,
        Alarm::Week1Before,
    ];

    pub const ALL_DAY: [Alarm; 4] = [
        Alarm::SameDayAt9,
        Alarm::DayBeforeAt9,
        Alarm::TwoDaysBeforeAt9,
        Alarm::WeekBeforeAt9,
    ];

    /// Seconds before the occurrence start; negative means after.
    pub fn seconds_before(self) -> i64 {
        match self {
            Alarm::AtStart => 0,
            Alarm::Minutes15Before => 15 * 60,
            Alarm::Minutes30Before => 30 * 60,
            Alarm::Hour1Before => 60 * 60,
            Alarm::Day1Before => 24 * 60 * 60,
            Alarm::Days2Before => 2 * 24 * 60 * 60,
            Alarm::Week1Before => 7 * 24 * 60 * 60,
            Alarm::SameDayAt9 => -9 * 60 * 60,
            Alarm::DayBeforeAt9 => 15 * 60 * 60,
            Alarm::TwoDaysBeforeAt9 => 39 * 60 * 60,
            Alarm::WeekBeforeAt9 => 159 * 60 * 60,
        }
    }

    pub fn from_seconds_before(seconds: i64) -> Option<Self> {
        Self::TIMED
            .into_iter()
            .chain(Self::ALL_DAY)
            .find(|alarm| alarm.seconds_before() == seconds)
    }

    /// Offset from the occurrence start to the trigger instant.
    pub fn trigger_offset(self) -> Duration {
        Duration::seconds(-self.seconds_before())
    }

    pub fn is_all_day(self) -> bool {
        Self::ALL_DAY.contains(&self)
    }

    pub fn label(self) -> &'static str {
        match self {
            Alarm::AtStart => "At start",
            Alarm::Minutes15Before => "15 minutes before",
            Alarm::Minutes30Before => "30 minutes before",
            Alarm::Hour1Before => "1 hour before",
            Alarm::Day1Before => "1 day before",
            Alarm::Days2Before => "2 days before",
            Alarm::Week1Before => "1 week before",
            Alarm::SameDayAt9 => "On the day (9:00)",
            Alarm::DayBeforeAt9 => "1 day before (9:00)",
            Alarm::TwoDaysBeforeAt9 => "2 days before (9:00)",
            Alarm::WeekBeforeAt9 => "1 week before (9:00)",
        }
    }
}
