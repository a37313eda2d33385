use crate::models::alarm::Alarm;
use crate::models::recurrence::RecurrenceRule;
use crate::models::schedule::Schedule;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};

use super::utils::{midnight, param, parse_date, parse_datetime, parse_trigger, unescape_text, unfold_lines};
use super::LUNAR_PROPERTY;

/// Fields collected from one VEVENT before it becomes a schedule.
#[derive(Default)]
struct Draft {
    title: String,
    description: Option<String>,
    location: Option<String>,
    start: Option<DateTime<Local>>,
    end: Option<DateTime<Local>>,
    // Exclusive, as written in DTEND;VALUE=DATE
    end_date: Option<NaiveDate>,
    all_day: bool,
    lunar: bool,
    rrule: Option<String>,
    exceptions: Vec<DateTime<Local>>,
    alarms: Vec<Alarm>,
}

pub(super) fn from_str(ics_content: &str, type_id: i64) -> Result<Vec<Schedule>> {
    let mut schedules = Vec::new();
    let mut current: Option<Draft> = None;
    let mut in_alarm = false;

    for line in unfold_lines(ics_content) {
        let line = line.trim();

        match line {
            "BEGIN:VEVENT" => current = Some(Draft::default()),
            "END:VEVENT" => {
                in_alarm = false;
                if let Some(draft) = current.take() {
                    if let Some(schedule) = draft.into_schedule(type_id)? {
                        schedules.push(schedule);
                    }
                }
            }
            "BEGIN:VALARM" => in_alarm = true,
            "END:VALARM" => in_alarm = false,
            _ => {
                if let Some(draft) = current.as_mut() {
                    if in_alarm {
                        parse_alarm_property(line, draft);
                    } else {
                        parse_event_property(line, draft)?;
                    }
                }
            }
        }
    }

    log::info!("Parsed {} schedule(s) from iCalendar data", schedules.len());
    Ok(schedules)
}

fn split_property(line: &str) -> Option<(&str, &str, &str)> {
    let (key_part, value) = line.split_once(':')?;
    let name = key_part.split(';').next().unwrap_or(key_part);
    Some((name, key_part, value))
}

fn parse_event_property(line: &str, draft: &mut Draft) -> Result<()> {
    let Some((name, key_part, value)) = split_property(line) else {
        return Ok(());
    };
    let is_date = param(key_part, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"));
    let tzid = param(key_part, "TZID");

    match name {
        "SUMMARY" => draft.title = unescape_text(value),
        "DESCRIPTION" => draft.description = Some(unescape_text(value)),
        "LOCATION" => draft.location = Some(unescape_text(value)),
        "DTSTART" => {
            if is_date {
                draft.all_day = true;
                draft.start = Some(midnight(parse_date(value)?)?);
            } else {
                draft.start = Some(parse_datetime(value, tzid)?);
            }
        }
        "DTEND" => {
            if is_date {
                draft.end_date = Some(parse_date(value)?);
            } else {
                draft.end = Some(parse_datetime(value, tzid)?);
            }
        }
        "RRULE" => draft.rrule = Some(value.to_string()),
        "EXDATE" => {
            for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let exception = if is_date {
                    midnight(parse_date(item)?)?
                } else {
                    parse_datetime(item, tzid)?
                };
                draft.exceptions.push(exception);
            }
        }
        _ if name == LUNAR_PROPERTY => draft.lunar = value.eq_ignore_ascii_case("TRUE"),
        _ => {}
    }

    Ok(())
}

fn parse_alarm_property(line: &str, draft: &mut Draft) {
    let Some(("TRIGGER", key_part, value)) = split_property(line) else {
        return;
    };
    if param(key_part, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE-TIME")) {
        log::warn!("Skipping absolute alarm trigger {}", value);
        return;
    }

    match parse_trigger(value).map(Alarm::from_seconds_before) {
        Ok(Some(alarm)) if !draft.alarms.contains(&alarm) => draft.alarms.push(alarm),
        Ok(Some(_)) => {}
        Ok(None) => log::warn!("Skipping alarm with unsupported offset {}", value),
        Err(e) => log::warn!("Skipping alarm: {}", e),
    }
}

impl Draft {
    fn into_schedule(self, type_id: i64) -> Result<Option<Schedule>> {
        if self.title.trim().is_empty() {
            log::warn!("Skipping VEVENT without SUMMARY");
            return Ok(None);
        }
        let Some(start) = self.start else {
            log::warn!("Skipping '{}': no DTSTART", self.title);
            return Ok(None);
        };

        let end = if self.all_day {
            let last_day = self
                .end_date
                .and_then(|d| d.pred_opt())
                .filter(|d| *d >= start.date_naive())
                .unwrap_or(start.date_naive());
            midnight(last_day)?
        } else {
            self.end.unwrap_or(start)
        };

        let recurrence = RecurrenceRule::from_rrule(self.rrule.as_deref(), self.lunar, self.exceptions)
            .with_context(|| format!("Unsupported recurrence on '{}'", self.title))?;

        let mut builder = Schedule::builder()
            .type_id(type_id)
            .title(self.title.trim())
            .start(start)
            .end(end)
            .all_day(self.all_day)
            .lunar(self.lunar)
            .recurrence(recurrence);
        if let Some(description) = self.description {
            builder = builder.description(description);
        }
        if let Some(location) = self.location {
            builder = builder.location(location);
        }
        for alarm in self.alarms {
            builder = builder.alarm(alarm);
        }

        let schedule = builder
            .build()
            .with_context(|| format!("Invalid schedule '{}'", self.title))?;
        Ok(Some(schedule))
    }
}
