//! Schedule type service: creation under the per-account cap, the
//! system/user privilege split, and delete-with-cascade.

use chrono::Local;
use rusqlite::{params, Connection, Row};

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::schedule_type::{
    default_types, validate_color, validate_name, ScheduleType, TypePrivilege, MAX_TYPES_PER_ACCOUNT,
};

const TYPE_COLUMNS: &str = "id, account_id, name, color, privilege, is_visible";

/// Service for managing schedule types.
pub struct ScheduleTypeService<'a> {
    conn: &'a Connection,
    limit: usize,
}

impl<'a> ScheduleTypeService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self::with_limit(conn, MAX_TYPES_PER_ACCOUNT)
    }

    /// Use a configured cap instead of the default of 20.
    pub fn with_limit(conn: &'a Connection, limit: usize) -> Self {
        Self { conn, limit }
    }

    /// Create a user type in an account.
    pub fn create(&self, schedule_type: ScheduleType) -> ScheduleResult<ScheduleType> {
        schedule_type
            .validate()
            .map_err(|e| ScheduleError::Validation(e.to_string()))?;
        self.ensure_account_exists(schedule_type.account_id)?;

        let count = self.count_for_account(schedule_type.account_id)?;
        if count >= self.limit {
            log::warn!(
                "Account {} already holds {} schedule types",
                schedule_type.account_id,
                count
            );
            return Err(ScheduleError::capacity("schedule types", self.limit));
        }

        self.insert(schedule_type)
    }

    /// Seed the system types into an account that has none.
    pub fn seed_defaults(&self, account_id: i64) -> ScheduleResult<Vec<ScheduleType>> {
        if self.count_for_account(account_id)? > 0 {
            return Ok(Vec::new());
        }

        log::info!("Seeding default schedule types for account {}", account_id);
        default_types(account_id)
            .into_iter()
            .map(|schedule_type| self.insert(schedule_type))
            .collect()
    }

    pub fn get(&self, id: i64) -> ScheduleResult<Option<ScheduleType>> {
        let result = self.conn.query_row(
            &format!("SELECT {} FROM schedule_types WHERE id = ?1", TYPE_COLUMNS),
            [id],
            map_type_row,
        );

        match result {
            Ok(schedule_type) => Ok(Some(schedule_type)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Types of an account, system types first.
    pub fn list_for_account(&self, account_id: i64) -> ScheduleResult<Vec<ScheduleType>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM schedule_types
             WHERE account_id = ?1
             ORDER BY privilege = 'system' DESC, id ASC",
            TYPE_COLUMNS
        ))?;

        let types = stmt
            .query_map([account_id], map_type_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(types)
    }

    /// Rename a user type. System types keep their names.
    pub fn rename(&self, id: i64, name: &str) -> ScheduleResult<()> {
        let existing = self.require(id)?;
        if existing.is_system() {
            return Err(ScheduleError::PermissionDenied(format!(
                "cannot rename system type '{}'",
                existing.name
            )));
        }
        validate_name(name).map_err(|e| ScheduleError::Validation(e.to_string()))?;

        self.touch("name", name.trim(), id)
    }

    pub fn recolor(&self, id: i64, color: &str) -> ScheduleResult<()> {
        self.require(id)?;
        validate_color(color).map_err(|e| ScheduleError::Validation(e.to_string()))?;

        self.touch("color", color.trim(), id)
    }

    pub fn set_visibility(&self, id: i64, visible: bool) -> ScheduleResult<()> {
        self.require(id)?;
        self.conn.execute(
            "UPDATE schedule_types SET is_visible = ?1, updated_at = ?2 WHERE id = ?3",
            params![visible as i32, Local::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Number of schedules filed under a type.
    pub fn schedule_count(&self, id: i64) -> ScheduleResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM schedules WHERE type_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Delete a user type together with its schedules, atomically.
    /// Returns how many schedules went with it.
    pub fn delete(&self, id: i64) -> ScheduleResult<usize> {
        let existing = self.require(id)?;
        if existing.is_system() {
            return Err(ScheduleError::PermissionDenied(format!(
                "cannot delete system type '{}'",
                existing.name
            )));
        }

        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM schedules WHERE type_id = ?1", [id])?;
        tx.execute("DELETE FROM schedule_types WHERE id = ?1", [id])?;
        tx.commit()?;

        log::info!(
            "Deleted schedule type {} '{}' and {} schedule(s)",
            id,
            existing.name,
            removed
        );
        Ok(removed)
    }

    fn require(&self, id: i64) -> ScheduleResult<ScheduleType> {
        self.get(id)?
            .ok_or_else(|| ScheduleError::not_found("schedule type", id))
    }

    fn insert(&self, mut schedule_type: ScheduleType) -> ScheduleResult<ScheduleType> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO schedule_types (account_id, name, color, privilege, is_visible, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                schedule_type.account_id,
                schedule_type.name.trim(),
                schedule_type.color.trim(),
                schedule_type.privilege.as_str(),
                schedule_type.visible as i32,
                now,
            ],
        )?;

        schedule_type.id = Some(self.conn.last_insert_rowid());
        schedule_type.name = schedule_type.name.trim().to_string();
        schedule_type.color = schedule_type.color.trim().to_string();
        Ok(schedule_type)
    }

    // `column` is always one of our own literals.
    fn touch(&self, column: &str, value: &str, id: i64) -> ScheduleResult<()> {
        self.conn.execute(
            &format!(
                "UPDATE schedule_types SET {} = ?1, updated_at = ?2 WHERE id = ?3",
                column
            ),
            params![value, Local::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    fn count_for_account(&self, account_id: i64) -> ScheduleResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM schedule_types WHERE account_id = ?1",
            [account_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
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
}

fn map_type_row(row: &Row<'_>) -> rusqlite::Result<ScheduleType> {
    let privilege: String = row.get(4)?;
    Ok(ScheduleType {
        id: Some(row.get(0)?),
        account_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        privilege: TypePrivilege::from_db(&privilege),
        visible: row.get::<_, i32>(5)? != 0,
    })
}
