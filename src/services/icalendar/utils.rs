use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

use crate::utils::date::{resolve_in, resolve_local, start_of_day};

const MAX_LINE_OCTETS: usize = 75;

pub(super) fn format_datetime(dt: &DateTime<Local>) -> String {
    dt.format("%Y%m%dT%H%M%S").to_string()
}

pub(super) fn format_utc(dt: &DateTime<Local>) -> String {
    dt.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ").to_string()
}

pub(super) fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub(super) fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

pub(super) fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Split a content line into 75-octet pieces joined by CRLF + space.
pub(super) fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        // Continuation lines spend one octet on the leading space.
        if width + len > MAX_LINE_OCTETS {
            folded.push_str("\r\n ");
            width = 1;
        }
        folded.push(c);
        width += len;
    }
    folded
}

/// Join folded continuation lines back onto their logical line.
pub(super) fn unfold_lines(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in content.lines() {
        let raw = raw.trim_end_matches('\r');
        match (raw.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(rest), Some(last)) => last.push_str(rest),
            _ => lines.push(raw.to_string()),
        }
    }
    lines
}

/// Value of a property parameter such as `TZID` from `DTSTART;TZID=...`.
pub(super) fn param<'a>(key_part: &'a str, name: &str) -> Option<&'a str> {
    key_part.split(';').skip(1).find_map(|p| {
        let (key, value) = p.split_once('=')?;
        key.eq_ignore_ascii_case(name).then(|| value.trim_matches('"'))
    })
}

pub(super) fn parse_datetime(s: &str, tzid: Option<&str>) -> Result<DateTime<Local>> {
    let has_utc_suffix = s.ends_with('Z');
    let normalized = s.trim_end_matches('Z');

    let naive = NaiveDateTime::parse_from_str(normalized, "%Y%m%dT%H%M%S")
        .map_err(|e| anyhow!("Invalid datetime '{}': {}", s, e))?;

    if has_utc_suffix {
        return Ok(Utc.from_utc_datetime(&naive).with_timezone(&Local));
    }

    if let Some(tz_name) = tzid {
        match Tz::from_str(tz_name) {
            Ok(timezone) => {
                if let Some(dt) = resolve_in(&timezone, naive) {
                    return Ok(dt.with_timezone(&Local));
                }
            }
            Err(_) => log::warn!("Unknown TZID '{}', reading {} as local time", tz_name, s),
        }
    }

    resolve_local(naive).ok_or_else(|| anyhow!("Invalid local datetime: {}", s))
}

pub(super) fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|e| anyhow!("Invalid date '{}': {}", s, e))
}

pub(super) fn midnight(date: NaiveDate) -> Result<DateTime<Local>> {
    start_of_day(date).ok_or_else(|| anyhow!("No local midnight on {}", date))
}

/// `TRIGGER` value for an alarm firing `seconds_before` the start.
pub(super) fn format_trigger(seconds_before: i64) -> String {
    if seconds_before == 0 {
        return "PT0S".to_string();
    }
    let sign = if seconds_before > 0 { "-" } else { "" };
    format!("{}PT{}S", sign, seconds_before.abs())
}

/// Seconds before the start encoded by a relative `TRIGGER` duration.
pub(super) fn parse_trigger(value: &str) -> Result<i64> {
    let (negative, rest) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let rest = rest
        .strip_prefix('P')
        .ok_or_else(|| anyhow!("Invalid trigger duration: {}", value))?;

    let mut seconds = 0i64;
    let mut digits = String::new();
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            'T' => {}
            'W' | 'D' | 'H' | 'M' | 'S' => {
                let n: i64 = digits
                    .parse()
                    .map_err(|_| anyhow!("Invalid trigger duration: {}", value))?;
                digits.clear();
                seconds += n * match c {
                    'W' => 7 * 86_400,
                    'D' => 86_400,
                    'H' => 3_600,
                    'M' => 60,
                    _ => 1,
                };
            }
            _ => return Err(anyhow!("Invalid trigger duration: {}", value)),
        }
    }

    Ok(if negative { seconds } else { -seconds })
}
