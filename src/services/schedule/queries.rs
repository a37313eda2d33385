use super::shared::{map_schedule_row, SCHEDULE_COLUMNS};
use super::ScheduleService;
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::query::{DateRange, QueryParams};
use crate::models::schedule::{Occurrence, Schedule};
use crate::services::query::{self as engine, ScheduleMap};
use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{self, Params};

impl<'a> ScheduleService<'a> {
    /// List every schedule ordered by start date.
    pub fn list_all(&self) -> ScheduleResult<Vec<Schedule>> {
        self.select("", [])
    }

    /// List the schedules of one type.
    pub fn list_by_type(&self, type_id: i64) -> ScheduleResult<Vec<Schedule>> {
        self.select("WHERE s.type_id = ?1", [type_id])
    }

    /// List every schedule owned by an account, hidden types included.
    pub fn list_for_account(&self, account_id: i64) -> ScheduleResult<Vec<Schedule>> {
        self.ensure_account_exists(account_id)?;
        self.select(
            "JOIN schedule_types t ON s.type_id = t.id WHERE t.account_id = ?1",
            [account_id],
        )
    }

    /// List the schedules an account displays: those of its visible types.
    pub fn list_visible_for_account(&self, account_id: i64) -> ScheduleResult<Vec<Schedule>> {
        self.ensure_account_exists(account_id)?;
        self.select(
            "JOIN schedule_types t ON s.type_id = t.id
             WHERE t.account_id = ?1 AND t.is_visible = 1",
            [account_id],
        )
    }

    /// Occurrences of the account's schedules grouped by date.
    pub fn schedule_map(&self, account_id: i64, range: &DateRange) -> ScheduleResult<ScheduleMap> {
        let schedules = self.list_visible_for_account(account_id)?;
        Ok(engine::schedule_map(&schedules, range))
    }

    /// Occurrences of the account's schedules on one date.
    pub fn day(&self, account_id: i64, date: NaiveDate) -> ScheduleResult<Vec<Occurrence>> {
        let schedules = self.list_visible_for_account(account_id)?;
        engine::day(&schedules, date)
    }

    pub fn query(&self, account_id: i64, params: &QueryParams) -> ScheduleResult<ScheduleMap> {
        let schedules = self.list_visible_for_account(account_id)?;
        engine::query(&schedules, params)
    }

    /// Keyword search within `window_months` either side of `now`.
    pub fn search(
        &self,
        account_id: i64,
        keyword: &str,
        now: DateTime<Local>,
        window_months: u32,
    ) -> ScheduleResult<ScheduleMap> {
        let range = DateRange::around(now, window_months)?;
        let schedules = self.list_visible_for_account(account_id)?;
        Ok(engine::search(&schedules, keyword, &range))
    }

    pub fn upcoming(
        &self,
        account_id: i64,
        from: DateTime<Local>,
        n: usize,
    ) -> ScheduleResult<Vec<Occurrence>> {
        let schedules = self.list_visible_for_account(account_id)?;
        Ok(engine::upcoming(&schedules, from, n))
    }

    fn ensure_account_exists(&self, account_id: i64) -> ScheduleResult<()> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE id = ?1",
            [account_id],
            |row| row.get(0),
        )?;

        if count == 0 {
            return Err(ScheduleError::not_found("account", account_id));
        }
        Ok(())
    }

    fn select<P: Params>(&self, clause: &str, params: P) -> ScheduleResult<Vec<Schedule>> {
        let sql = format!(
            "SELECT {} FROM schedules s {} ORDER BY s.start_datetime ASC, s.id ASC",
            SCHEDULE_COLUMNS, clause
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let schedules = stmt
            .query_map(params, map_schedule_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(schedules)
    }
}
