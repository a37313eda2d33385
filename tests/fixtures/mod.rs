// Test fixtures and helpers
// Shared setup for integration tests

#![allow(dead_code)]

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use rust_schedule::models::schedule::Schedule;
use rust_schedule::services::account::AccountService;
use rust_schedule::services::database::Database;
use rust_schedule::services::schedule_type::ScheduleTypeService;
use tempfile::TempDir;

/// A file-backed database with the local account and its system types.
pub struct TestStore {
    // Held so the directory outlives the connection
    _dir: TempDir,
    pub db: Database,
    pub account_id: i64,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = Database::new(dir.path().join("schedule.db")).expect("open database");
        db.initialize_schema().expect("schema");

        let account = AccountService::new(db.connection())
            .ensure_local()
            .expect("local account");

        Self {
            _dir: dir,
            db,
            account_id: account.id.expect("account id"),
        }
    }

    /// Id of a seeded system type by name.
    pub fn type_id(&self, name: &str) -> i64 {
        ScheduleTypeService::new(self.db.connection())
            .list_for_account(self.account_id)
            .expect("types")
            .into_iter()
            .find(|t| t.name == name)
            .and_then(|t| t.id)
            .expect("type exists")
    }
}

pub mod dates {
    use super::*;

    pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    pub fn midnight(y: i32, m: u32, d: u32) -> DateTime<Local> {
        at(y, m, d, 0)
    }
}

pub mod schedules {
    use super::*;
    use rust_schedule::models::recurrence::{RecurrenceKind, RecurrenceRule};

    /// One-hour schedule on the given day at 09:00.
    pub fn meeting(type_id: i64, title: &str, y: i32, m: u32, d: u32) -> Schedule {
        Schedule::new(type_id, title, dates::at(y, m, d, 9), dates::at(y, m, d, 10)).unwrap()
    }

    pub fn repeating(type_id: i64, title: &str, start: DateTime<Local>, rule: RecurrenceRule) -> Schedule {
        Schedule::builder()
            .type_id(type_id)
            .title(title)
            .start(start)
            .end(start + chrono::Duration::hours(1))
            .lunar(rule.kind.is_lunar())
            .recurrence(rule)
            .build()
            .unwrap()
    }

    pub fn daily(type_id: i64, title: &str, start: DateTime<Local>) -> Schedule {
        repeating(type_id, title, start, RecurrenceRule::new(RecurrenceKind::Daily))
    }
}
