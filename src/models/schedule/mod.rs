// Schedule module
// Calendar schedule model, its builder, and materialized occurrences

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::alarm::Alarm;
use crate::models::recurrence::{RecurrenceEnd, RecurrenceKind, RecurrenceRule};
use crate::utils::date::{start_of_day, start_of_next_day};

/// A calendar schedule, possibly the anchor of a recurring series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Option<i64>,
    pub type_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub all_day: bool,
    /// Recurrence follows the lunar calendar
    pub lunar: bool,
    pub recurrence: RecurrenceRule,
    pub alarms: Vec<Alarm>,
    pub created_at: Option<DateTime<Local>>,
    pub updated_at: Option<DateTime<Local>>,
}

impl Schedule {
    /// Create a non-recurring schedule in the given type.
    ///
    /// # Examples
    /// ```
    /// use rust_schedule::models::schedule::Schedule;
    /// use chrono::Local;
    ///
    /// let start = Local::now();
    /// let end = start + chrono::Duration::hours(1);
    /// let schedule = Schedule::new(1, "Team Meeting", start, end).unwrap();
    /// assert!(!schedule.is_recurring());
    /// ```
    pub fn new(
        type_id: i64,
        title: impl Into<String>,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> ScheduleResult<Self> {
        let schedule = Self {
            id: None,
            type_id,
            title: title.into(),
            description: None,
            location: None,
            start,
            end,
            all_day: false,
            lunar: false,
            recurrence: RecurrenceRule::none(),
            alarms: Vec::new(),
            created_at: None,
            updated_at: None,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::new()
    }

    pub fn validate(&self) -> ScheduleResult<()> {
        if self.title.trim().is_empty() {
            return Err(ScheduleError::Validation("Schedule title cannot be empty".into()));
        }

        if self.end < self.start {
            return Err(ScheduleError::InvalidRange(format!(
                "schedule ends ({}) before it starts ({})",
                self.end, self.start
            )));
        }

        if let RecurrenceEnd::Until(until) = self.recurrence.end {
            if until < self.start {
                return Err(ScheduleError::InvalidRecurrence(format!(
                    "series ends ({}) before its first instance ({})",
                    until, self.start
                )));
            }
        }

        self.recurrence.validate(self.lunar)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_recurring()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// The interval this schedule occupies. All-day schedules cover their
    /// start through end dates in full.
    pub fn span(&self) -> (DateTime<Local>, DateTime<Local>) {
        if !self.all_day {
            return (self.start, self.end);
        }

        let from = start_of_day(self.start.date_naive()).unwrap_or(self.start);
        let to = start_of_next_day(self.end.date_naive()).unwrap_or(self.end);
        (from, to)
    }

    /// Case-insensitive substring match over title, description and location.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [
            Some(self.title.as_str()),
            self.description.as_deref(),
            self.location.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(&needle))
    }
}

/// Builder for schedules with optional fields.
pub struct ScheduleBuilder {
    type_id: Option<i64>,
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: Option<DateTime<Local>>,
    end: Option<DateTime<Local>>,
    all_day: bool,
    lunar: bool,
    recurrence: RecurrenceRule,
    alarms: Vec<Alarm>,
}

impl ScheduleBuilder {
    pub fn new() -> Self {
        Self {
            type_id: None,
            title: None,
            description: None,
            location: None,
            start: None,
            end: None,
            all_day: false,
            lunar: false,
            recurrence: RecurrenceRule::none(),
            alarms: Vec::new(),
        }
    }

    pub fn type_id(mut self, type_id: i64) -> Self {
        self.type_id = Some(type_id);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn start(mut self, start: DateTime<Local>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Local>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    /// Mark the schedule as following the lunar calendar
    pub fn lunar(mut self, lunar: bool) -> Self {
        self.lunar = lunar;
        self
    }

    pub fn recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = rule;
        self
    }

    /// Shorthand for an unbounded rule of `kind`
    pub fn repeat(mut self, kind: RecurrenceKind) -> Self {
        self.recurrence = RecurrenceRule::new(kind);
        self
    }

    pub fn alarm(mut self, alarm: Alarm) -> Self {
        if !self.alarms.contains(&alarm) {
            self.alarms.push(alarm);
        }
        self
    }

    pub fn build(self) -> ScheduleResult<Schedule> {
        let title = self
            .title
            .ok_or_else(|| ScheduleError::Validation("Schedule title is required".into()))?;
        let start = self
            .start
            .ok_or_else(|| ScheduleError::Validation("Schedule start time is required".into()))?;
        let end = self.end.unwrap_or(start);

        let schedule = Schedule {
            id: None,
            type_id: self.type_id.unwrap_or_default(),
            title,
            description: self.description,
            location: self.location,
            start,
            end,
            all_day: self.all_day,
            lunar: self.lunar,
            recurrence: self.recurrence,
            alarms: self.alarms,
            created_at: None,
            updated_at: None,
        };

        schedule.validate()?;
        Ok(schedule)
    }
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One concrete instance of a schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    /// Copy of the schedule with start and end moved to this instance
    pub schedule: Schedule,
    /// 1-based position within the series
    pub sequence: u32,
    /// Instance start for every instance except the anchor
    pub recurrence_id: Option<DateTime<Local>>,
}

impl Occurrence {
    pub fn start(&self) -> DateTime<Local> {
        self.schedule.start
    }

    pub fn end(&self) -> DateTime<Local> {
        self.schedule.end
    }

    pub fn schedule_id(&self) -> Option<i64> {
        self.schedule.id
    }

    pub fn is_anchor(&self) -> bool {
        self.recurrence_id.is_none()
    }

    /// The interval this instance occupies, see [`Schedule::span`].
    pub fn span(&self) -> (DateTime<Local>, DateTime<Local>) {
        self.schedule.span()
    }
}
