//! Command handlers for the `rust-schedule` binary.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context as _, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};
use clap::Args;

use rust_schedule::models::alarm::Alarm;
use rust_schedule::models::query::{DateRange, QueryParams};
use rust_schedule::models::recurrence::{RecurrenceKind, RecurrenceRule};
use rust_schedule::models::schedule::{Occurrence, Schedule};
use rust_schedule::models::schedule_type::ScheduleType;
use rust_schedule::models::settings::Settings;
use rust_schedule::services::account::AccountService;
use rust_schedule::services::database::Database;
use rust_schedule::services::icalendar::ICalendarService;
use rust_schedule::services::query::{map_to_json, ScheduleMap};
use rust_schedule::services::reminder::reminders;
use rust_schedule::services::schedule::ScheduleService;
use rust_schedule::services::schedule_type::ScheduleTypeService;
use rust_schedule::services::settings::{resolve_database_path, SettingsService};
use rust_schedule::utils::date::{resolve_local, start_of_day};
use rust_schedule::utils::lunar::day_info;

#[derive(Args, Debug)]
pub struct AddArgs {
    pub title: String,
    /// "YYYY-MM-DD HH:MM", or "YYYY-MM-DD" with --all-day
    #[arg(short, long)]
    pub start: String,
    /// Same formats as --start; defaults to the start
    #[arg(short, long)]
    pub end: Option<String>,
    /// Schedule type name or id
    #[arg(short = 't', long = "type", default_value = "Work")]
    pub type_ref: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(short, long)]
    pub location: Option<String>,
    #[arg(long)]
    pub all_day: bool,
    /// Recur on the lunar calendar
    #[arg(long)]
    pub lunar: bool,
    /// none, daily, weekdays, weekly, monthly, yearly, lunar-monthly, lunar-yearly
    #[arg(short, long, default_value = "none")]
    pub repeat: String,
    #[arg(long, conflicts_with = "until")]
    pub count: Option<u32>,
    /// Last possible start, same formats as --start
    #[arg(long)]
    pub until: Option<String>,
    /// Minutes before the start; negative for after (all-day: -540 is 09:00)
    #[arg(long = "alarm", allow_negative_numbers = true)]
    pub alarms: Vec<i64>,
}

pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let service = match path {
        Some(path) => SettingsService::new(path),
        None => SettingsService::from_default_location()?,
    };
    service.load()
}

pub struct Context {
    db: Database,
    settings: Settings,
    json: bool,
}

impl Context {
    pub fn open(settings: Settings, database: Option<PathBuf>, json: bool) -> Result<Self> {
        let path = match database {
            Some(path) => path,
            None => resolve_database_path(&settings)?,
        };
        log::debug!("Opening database {:?}", path);

        let db = Database::new(&path)?;
        db.initialize_schema()?;
        Ok(Self { db, settings, json })
    }

    fn local_account_id(&self) -> Result<i64> {
        AccountService::new(self.db.connection())
            .ensure_local()?
            .id
            .ok_or_else(|| anyhow!("Local account has no id"))
    }

    fn types_service(&self) -> ScheduleTypeService<'_> {
        ScheduleTypeService::with_limit(self.db.connection(), self.settings.max_schedule_types)
    }

    fn resolve_type(&self, type_ref: &str) -> Result<i64> {
        let account_id = self.local_account_id()?;
        let types = self.types_service().list_for_account(account_id)?;

        types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(type_ref.trim()))
            .or_else(|| {
                let id = type_ref.trim().parse::<i64>().ok()?;
                types.iter().find(|t| t.id == Some(id))
            })
            .and_then(|t| t.id)
            .ok_or_else(|| anyhow!("No schedule type named '{}'", type_ref))
    }

    pub fn init(&self) -> Result<()> {
        let account_id = self.local_account_id()?;
        println!("Local account ready (id {})", account_id);
        self.types()
    }

    pub fn types(&self) -> Result<()> {
        let account_id = self.local_account_id()?;
        let service = self.types_service();
        let types = service.list_for_account(account_id)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&types)?);
            return Ok(());
        }

        for schedule_type in types {
            let id = schedule_type.id.unwrap_or_default();
            println!(
                "{:>4}  {:<20} {:<9} {:<6} {:<6} {} schedule(s)",
                id,
                schedule_type.name,
                schedule_type.color,
                schedule_type.privilege.as_str(),
                if schedule_type.visible { "shown" } else { "hidden" },
                service.schedule_count(id)?
            );
        }
        Ok(())
    }

    pub fn add_type(&self, name: &str, color: &str) -> Result<()> {
        let account_id = self.local_account_id()?;
        let created = self
            .types_service()
            .create(ScheduleType::new(account_id, name, color))?;
        println!("Created type {} '{}'", created.id.unwrap_or_default(), created.name);
        Ok(())
    }

    pub fn add(&self, args: AddArgs) -> Result<()> {
        let type_id = self.resolve_type(&args.type_ref)?;
        let start = parse_instant(&args.start)?;
        let end = args.end.as_deref().map(parse_instant).transpose()?.unwrap_or(start);

        let kind = RecurrenceKind::from_str(&args.repeat)?;
        let mut rule = RecurrenceRule::new(kind);
        if let Some(count) = args.count {
            rule = rule.count(count);
        }
        if let Some(until) = args.until.as_deref() {
            rule = rule.until(parse_instant(until)?);
        }

        let mut builder = Schedule::builder()
            .type_id(type_id)
            .title(args.title)
            .start(start)
            .end(end)
            .all_day(args.all_day)
            .lunar(args.lunar)
            .recurrence(rule);
        if let Some(description) = args.description {
            builder = builder.description(description);
        }
        if let Some(location) = args.location {
            builder = builder.location(location);
        }
        for minutes in args.alarms {
            let alarm = Alarm::from_seconds_before(minutes * 60)
                .ok_or_else(|| anyhow!("No alarm preset {} minutes before the start", minutes))?;
            builder = builder.alarm(alarm);
        }

        let created = ScheduleService::new(self.db.connection()).create(builder.build()?)?;
        println!("Created schedule {} '{}'", created.id.unwrap_or_default(), created.title);
        Ok(())
    }

    pub fn delete(&self, id: i64, occurrence: Option<&str>) -> Result<()> {
        let service = ScheduleService::new(self.db.connection());
        match occurrence {
            Some(text) => {
                service.delete_occurrence(id, parse_instant(text)?)?;
                println!("Removed the {} occurrence of schedule {}", text, id);
            }
            None => {
                service.delete(id)?;
                println!("Deleted schedule {}", id);
            }
        }
        Ok(())
    }

    pub fn range(
        &self,
        from: &str,
        to: &str,
        keyword: Option<String>,
        top: Option<usize>,
        kind: Option<&str>,
    ) -> Result<()> {
        let mut params = QueryParams::new(parse_day_start(from)?, parse_day_start(to)?);
        if let Some(keyword) = keyword {
            params = params.keyword(keyword);
        }
        if let Some(n) = top {
            params = params.top(n);
        }
        if let Some(kind) = kind {
            params = params.kind(RecurrenceKind::from_str(kind)?);
        }

        let account_id = self.local_account_id()?;
        let map = ScheduleService::new(self.db.connection()).query(account_id, &params)?;
        self.print_map(&map)
    }

    pub fn day(&self, date: Option<&str>) -> Result<()> {
        let date = match date {
            Some(text) => parse_date(text)?,
            None => Local::now().date_naive(),
        };

        let account_id = self.local_account_id()?;
        let occurrences = ScheduleService::new(self.db.connection()).day(account_id, date)?;
        let mut map = ScheduleMap::new();
        if !occurrences.is_empty() {
            map.insert(date, occurrences);
        }
        self.print_map(&map)
    }

    pub fn search(&self, keyword: &str, months: Option<u32>) -> Result<()> {
        let months = months.unwrap_or(self.settings.search_window_months);
        let account_id = self.local_account_id()?;
        let map = ScheduleService::new(self.db.connection()).search(
            account_id,
            keyword,
            Local::now(),
            months,
        )?;
        self.print_map(&map)
    }

    pub fn upcoming(&self, count: Option<usize>) -> Result<()> {
        let n = count.unwrap_or(self.settings.upcoming_count);
        let account_id = self.local_account_id()?;
        let next = ScheduleService::new(self.db.connection()).upcoming(account_id, Local::now(), n)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&next)?);
            return Ok(());
        }
        for occurrence in &next {
            println!(
                "{}  {}",
                occurrence.start().format("%Y-%m-%d"),
                describe(occurrence)
            );
        }
        Ok(())
    }

    pub fn reminders(&self, hours: i64) -> Result<()> {
        let now = Local::now();
        let range = DateRange::new(now, now + Duration::hours(hours.max(0)))?;
        let account_id = self.local_account_id()?;
        let schedules = ScheduleService::new(self.db.connection()).list_visible_for_account(account_id)?;
        let due = reminders(&schedules, &range);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&due)?);
            return Ok(());
        }
        for reminder in due {
            println!(
                "{}  {} (starts {})",
                reminder.fire_at.format("%Y-%m-%d %H:%M"),
                reminder.title,
                reminder.occurrence_start.format("%Y-%m-%d %H:%M")
            );
        }
        Ok(())
    }

    pub fn export(&self, output: &Path) -> Result<()> {
        let account_id = self.local_account_id()?;
        let schedules = ScheduleService::new(self.db.connection()).list_for_account(account_id)?;
        ICalendarService::new().export_to_file(&schedules, output)?;
        println!("Exported {} schedule(s) to {}", schedules.len(), output.display());
        Ok(())
    }

    pub fn import(&self, input: &Path, type_ref: &str) -> Result<()> {
        let type_id = self.resolve_type(type_ref)?;
        let parsed = ICalendarService::new().import_from_file(input, type_id)?;

        let service = ScheduleService::new(self.db.connection());
        let tx = self.db.connection().unchecked_transaction()?;
        for schedule in parsed.iter().cloned() {
            service
                .create(schedule)
                .with_context(|| format!("Failed to import {}", input.display()))?;
        }
        tx.commit()?;

        println!("Imported {} schedule(s)", parsed.len());
        Ok(())
    }

    pub fn lunar(&self, date: Option<&str>) -> Result<()> {
        let date = match date {
            Some(text) => parse_date(text)?,
            None => Local::now().date_naive(),
        };
        let info = day_info(date).ok_or_else(|| anyhow!("{} is outside the lunar calendar range", date))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&info)?);
            return Ok(());
        }
        println!(
            "{}  {}{}  {}年 {}月 {}日  {}",
            info.solar,
            info.month_name,
            info.day_name,
            info.year_ganzhi,
            info.month_ganzhi,
            info.day_ganzhi,
            info.zodiac
        );
        if let Some(festival) = info.festival {
            println!("{}", festival);
        }
        Ok(())
    }

    fn print_map(&self, map: &ScheduleMap) -> Result<()> {
        if self.json {
            println!("{}", map_to_json(map)?);
            return Ok(());
        }
        if map.is_empty() {
            println!("No schedules");
            return Ok(());
        }

        for (date, occurrences) in map {
            println!("{}", date.format("%Y-%m-%d %a"));
            for occurrence in occurrences {
                println!("  {}", describe(occurrence));
            }
        }
        Ok(())
    }
}

fn describe(occurrence: &Occurrence) -> String {
    let schedule = &occurrence.schedule;
    let when = if schedule.all_day {
        "all day    ".to_string()
    } else {
        format!(
            "{}-{}",
            occurrence.start().format("%H:%M"),
            occurrence.end().format("%H:%M")
        )
    };
    format!(
        "{}  {} [#{} {}]",
        when,
        schedule.title,
        occurrence.schedule_id().unwrap_or_default(),
        occurrence.sequence
    )
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", text))
}

fn parse_day_start(text: &str) -> Result<DateTime<Local>> {
    let date = parse_date(text)?;
    start_of_day(date).ok_or_else(|| anyhow!("No local midnight on {}", date))
}

/// "YYYY-MM-DD HH:MM", "YYYY-MM-DDTHH:MM" or a bare date at midnight.
fn parse_instant(text: &str) -> Result<DateTime<Local>> {
    let text = text.trim();
    let naive = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok());

    match naive {
        Some(naive) => resolve_local(naive).ok_or_else(|| anyhow!("Invalid local time '{}'", text)),
        None => parse_day_start(text),
    }
}
