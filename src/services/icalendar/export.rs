use crate::models::schedule::Schedule;
use chrono::{Local, Utc};

use super::utils::{escape_text, fold_line, format_date, format_datetime, format_trigger, format_utc};
use super::LUNAR_PROPERTY;

pub(super) fn multiple(schedules: &[Schedule]) -> String {
    let mut ics = calendar_header();
    for (index, schedule) in schedules.iter().enumerate() {
        append_schedule(&mut ics, schedule, index);
    }
    ics.push_str("END:VCALENDAR\r\n");
    ics
}

fn calendar_header() -> String {
    let mut ics = String::new();
    ics.push_str("BEGIN:VCALENDAR\r\n");
    ics.push_str("VERSION:2.0\r\n");
    ics.push_str("PRODID:-//Rust Schedule//EN\r\n");
    ics.push_str("CALSCALE:GREGORIAN\r\n");
    ics
}

fn push_line(buffer: &mut String, line: String) {
    buffer.push_str(&fold_line(&line));
    buffer.push_str("\r\n");
}

fn append_schedule(buffer: &mut String, schedule: &Schedule, index: usize) {
    buffer.push_str("BEGIN:VEVENT\r\n");
    push_line(buffer, format!("UID:{}", build_uid(schedule, index)));

    let dtstamp = schedule.updated_at.unwrap_or_else(Local::now);
    push_line(buffer, format!("DTSTAMP:{}", format_utc(&dtstamp)));

    if schedule.all_day {
        let first = schedule.start.date_naive();
        // DTEND is exclusive for dates.
        let after_last = schedule.end.date_naive().succ_opt().unwrap_or(first);
        push_line(buffer, format!("DTSTART;VALUE=DATE:{}", format_date(first)));
        push_line(buffer, format!("DTEND;VALUE=DATE:{}", format_date(after_last)));
    } else {
        push_line(buffer, format!("DTSTART:{}", format_datetime(&schedule.start)));
        push_line(buffer, format!("DTEND:{}", format_datetime(&schedule.end)));
    }

    push_line(buffer, format!("SUMMARY:{}", escape_text(&schedule.title)));
    if let Some(desc) = &schedule.description {
        push_line(buffer, format!("DESCRIPTION:{}", escape_text(desc)));
    }
    if let Some(location) = &schedule.location {
        push_line(buffer, format!("LOCATION:{}", escape_text(location)));
    }

    if let Some(rrule) = schedule.recurrence.to_rrule() {
        push_line(buffer, format!("RRULE:{}", rrule));
    }
    let exceptions = schedule.recurrence.exceptions();
    if !exceptions.is_empty() {
        let line = if schedule.all_day {
            let dates: Vec<String> = exceptions
                .iter()
                .map(|dt| format_date(dt.date_naive()))
                .collect();
            format!("EXDATE;VALUE=DATE:{}", dates.join(","))
        } else {
            let dates: Vec<String> = exceptions.iter().map(format_datetime).collect();
            format!("EXDATE:{}", dates.join(","))
        };
        push_line(buffer, line);
    }
    if schedule.lunar {
        push_line(buffer, format!("{}:TRUE", LUNAR_PROPERTY));
    }

    if let Some(created) = &schedule.created_at {
        push_line(buffer, format!("CREATED:{}", format_utc(created)));
    }
    if let Some(updated) = &schedule.updated_at {
        push_line(buffer, format!("LAST-MODIFIED:{}", format_utc(updated)));
    }

    for alarm in &schedule.alarms {
        buffer.push_str("BEGIN:VALARM\r\n");
        buffer.push_str("ACTION:DISPLAY\r\n");
        push_line(buffer, format!("DESCRIPTION:{}", escape_text(&schedule.title)));
        push_line(buffer, format!("TRIGGER:{}", format_trigger(alarm.seconds_before())));
        buffer.push_str("END:VALARM\r\n");
    }

    buffer.push_str("END:VEVENT\r\n");
}

fn build_uid(schedule: &Schedule, index: usize) -> String {
    if let Some(id) = schedule.id {
        format!("rust-schedule-{}", id)
    } else {
        format!("rust-schedule-temp-{}-{}", Utc::now().timestamp(), index)
    }
}
