//! RFC 5545 (.ics) import/export of schedules.

pub mod export;
pub mod import;
mod service;
mod utils;

pub use service::ICalendarService;

/// Marks a VEVENT whose recurrence follows the lunar calendar.
pub(crate) const LUNAR_PROPERTY: &str = "X-LUNAR-CALENDAR";
