use chrono::{DateTime, Local};
use rusqlite::types::Type;
use rusqlite::{self, Row};

use crate::error::ScheduleResult;
use crate::models::alarm::Alarm;
use crate::models::recurrence::RecurrenceRule;
use crate::models::schedule::Schedule;

pub(crate) const SCHEDULE_COLUMNS: &str = "s.id, s.type_id, s.title, s.description, s.location,
    s.start_datetime, s.end_datetime, s.is_all_day, s.is_lunar, s.recurrence_rule,
    s.recurrence_exceptions, s.alarms, s.created_at, s.updated_at";

pub(crate) fn serialize_exceptions(exceptions: &[DateTime<Local>]) -> ScheduleResult<Option<String>> {
    if exceptions.is_empty() {
        return Ok(None);
    }
    let serialized: Vec<String> = exceptions.iter().map(|dt| dt.to_rfc3339()).collect();
    Ok(Some(serde_json::to_string(&serialized)?))
}

pub(crate) fn deserialize_exceptions(json: Option<String>) -> rusqlite::Result<Vec<DateTime<Local>>> {
    let Some(json) = json else {
        return Ok(Vec::new());
    };

    let dates: Vec<String> = serde_json::from_str(&json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;
    let parsed = dates
        .into_iter()
        .filter_map(|value| match DateTime::parse_from_rfc3339(&value) {
            Ok(dt) => Some(dt.with_timezone(&Local)),
            Err(e) => {
                log::warn!("Skipping unreadable exception date '{}': {}", value, e);
                None
            }
        })
        .collect();

    Ok(parsed)
}

/// Alarms persist as the list of their offsets in seconds before start.
pub(crate) fn serialize_alarms(alarms: &[Alarm]) -> ScheduleResult<String> {
    let offsets: Vec<i64> = alarms.iter().map(|a| a.seconds_before()).collect();
    Ok(serde_json::to_string(&offsets)?)
}

pub(crate) fn deserialize_alarms(json: String) -> rusqlite::Result<Vec<Alarm>> {
    let offsets: Vec<i64> = serde_json::from_str(&json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, Box::new(e)))?;
    Ok(offsets
        .into_iter()
        .filter_map(|secs| {
            let alarm = Alarm::from_seconds_before(secs);
            if alarm.is_none() {
                log::warn!("Ignoring unknown alarm offset {}s", secs);
            }
            alarm
        })
        .collect())
}

pub(crate) fn to_local_datetime(value: String) -> rusqlite::Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

/// Maps a row selected with [`SCHEDULE_COLUMNS`].
pub(crate) fn map_schedule_row(row: &Row<'_>) -> rusqlite::Result<Schedule> {
    let lunar = row.get::<_, i32>(8)? != 0;
    let rrule: Option<String> = row.get(9)?;
    let exceptions = deserialize_exceptions(row.get(10)?)?;
    let recurrence = RecurrenceRule::from_rrule(rrule.as_deref(), lunar, exceptions)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;

    Ok(Schedule {
        id: Some(row.get(0)?),
        type_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        start: to_local_datetime(row.get::<_, String>(5)?)?,
        end: to_local_datetime(row.get::<_, String>(6)?)?,
        all_day: row.get::<_, i32>(7)? != 0,
        lunar,
        recurrence,
        alarms: deserialize_alarms(row.get(11)?)?,
        created_at: Some(to_local_datetime(row.get::<_, String>(12)?)?),
        updated_at: Some(to_local_datetime(row.get::<_, String>(13)?)?),
    })
}
