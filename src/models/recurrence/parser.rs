use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::{RecurrenceEnd, RecurrenceKind, RecurrenceRule};
use crate::error::{ScheduleError, ScheduleResult};
use crate::utils::date::resolve_local;

const WEEKDAY_CODES: [&str; 5] = ["MO", "TU", "WE", "TH", "FR"];

/// Render the kind and end bound as an RRULE value. Exceptions are stored
/// separately and are not part of the text.
pub fn format_rrule(rule: &RecurrenceRule) -> Option<String> {
    let base = match rule.kind {
        RecurrenceKind::None => return None,
        RecurrenceKind::Daily => "FREQ=DAILY".to_string(),
        RecurrenceKind::Weekdays => format!("FREQ=DAILY;BYDAY={}", WEEKDAY_CODES.join(",")),
        RecurrenceKind::Weekly => "FREQ=WEEKLY".to_string(),
        RecurrenceKind::Monthly | RecurrenceKind::LunarMonthly => "FREQ=MONTHLY".to_string(),
        RecurrenceKind::Yearly | RecurrenceKind::LunarYearly => "FREQ=YEARLY".to_string(),
    };

    let rrule = match rule.end {
        RecurrenceEnd::Never => base,
        RecurrenceEnd::Count(n) => format!("{};COUNT={}", base, n),
        RecurrenceEnd::Until(until) => format!(
            "{};UNTIL={}",
            base,
            until.format("%Y%m%dT%H%M%S")
        ),
    };

    Some(rrule)
}

/// Parse the RRULE subset this engine supports.
pub fn parse_rrule(rrule: &str, lunar: bool) -> ScheduleResult<RecurrenceRule> {
    let body = rrule.trim();
    let body = body.strip_prefix("RRULE:").unwrap_or(body);

    let mut freq = None;
    let mut byday = None;
    let mut count = None;
    let mut until = None;

    for part in body.split(';').filter(|p| !p.is_empty()) {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| invalid(format!("malformed part '{}'", part)))?;

        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => freq = Some(value.trim().to_ascii_uppercase()),
            "BYDAY" => byday = Some(value.trim().to_ascii_uppercase()),
            "COUNT" => {
                let n = value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("bad COUNT '{}'", value)))?;
                count = Some(n);
            }
            "UNTIL" => until = Some(parse_until(value.trim())?),
            "INTERVAL" => {
                if value.trim() != "1" {
                    return Err(invalid(format!("unsupported INTERVAL '{}'", value)));
                }
            }
            "WKST" => {}
            other => return Err(invalid(format!("unsupported part '{}'", other))),
        }
    }

    let freq = freq.ok_or_else(|| invalid("missing FREQ".to_string()))?;
    let kind = match (freq.as_str(), byday.as_deref(), lunar) {
        ("DAILY", None, _) => RecurrenceKind::Daily,
        ("DAILY", Some(days), _) if is_weekday_set(days) => RecurrenceKind::Weekdays,
        ("WEEKLY", None, _) => RecurrenceKind::Weekly,
        ("MONTHLY", None, false) => RecurrenceKind::Monthly,
        ("MONTHLY", None, true) => RecurrenceKind::LunarMonthly,
        ("YEARLY", None, false) => RecurrenceKind::Yearly,
        ("YEARLY", None, true) => RecurrenceKind::LunarYearly,
        (_, Some(days), _) => return Err(invalid(format!("unsupported BYDAY '{}'", days))),
        (other, None, _) => return Err(invalid(format!("unsupported FREQ '{}'", other))),
    };

    let rule = RecurrenceRule::new(kind);
    match (count, until) {
        (Some(_), Some(_)) => Err(invalid("COUNT and UNTIL are mutually exclusive".to_string())),
        (Some(n), None) => Ok(rule.count(n)),
        (None, Some(dt)) => Ok(rule.until(dt)),
        (None, None) => Ok(rule),
    }
}

fn is_weekday_set(days: &str) -> bool {
    let mut codes: Vec<&str> = days.split(',').map(str::trim).collect();
    codes.sort_by_key(|code| WEEKDAY_CODES.iter().position(|c| c == code));
    codes == WEEKDAY_CODES
}

/// UNTIL as a date (end of that local day), a floating local date-time, or
/// a UTC date-time with a trailing `Z`.
fn parse_until(value: &str) -> ScheduleResult<DateTime<Local>> {
    if value.len() == 8 {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d")
            .map_err(|_| invalid(format!("bad UNTIL '{}'", value)))?;
        let end_of_day = date
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| invalid(format!("bad UNTIL '{}'", value)))?;
        return resolve_local(end_of_day).ok_or_else(|| invalid(format!("bad UNTIL '{}'", value)));
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .map_err(|_| invalid(format!("bad UNTIL '{}'", value)))?;
        return Ok(Utc.from_utc_datetime(&naive).with_timezone(&Local));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .map_err(|_| invalid(format!("bad UNTIL '{}'", value)))?;
    resolve_local(naive).ok_or_else(|| invalid(format!("bad UNTIL '{}'", value)))
}

fn invalid(message: String) -> ScheduleError {
    ScheduleError::InvalidRecurrence(message)
}
