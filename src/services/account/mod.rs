//! Account service.
//!
//! Exactly one local account exists once the store is initialised, and at
//! most one networked account may sit beside it.

use chrono::Local;
use rusqlite::{params, Connection, Row};

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::account::{Account, AccountKind};
use crate::services::schedule::shared::to_local_datetime;
use crate::services::schedule_type::ScheduleTypeService;

pub struct AccountService<'a> {
    conn: &'a Connection,
}

impl<'a> AccountService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Return the local account, creating it and its system types on first
    /// use.
    pub fn ensure_local(&self) -> ScheduleResult<Account> {
        if let Some(account) = self.local()? {
            return Ok(account);
        }

        let tx = self.conn.unchecked_transaction()?;
        let account = insert(&tx, Account::local())?;
        if let Some(id) = account.id {
            ScheduleTypeService::new(&tx).seed_defaults(id)?;
        }
        tx.commit()?;

        log::info!("Created local account {:?}", account.id);
        Ok(account)
    }

    /// Add the networked account. Only one may exist.
    pub fn add_union_account(&self, name: &str) -> ScheduleResult<Account> {
        if name.trim().is_empty() {
            return Err(ScheduleError::Validation("Account name cannot be empty".into()));
        }
        if self.find_by_kind(AccountKind::Union)?.is_some() {
            return Err(ScheduleError::capacity("networked accounts", 1));
        }

        let account = insert(self.conn, Account::union(name.trim()))?;
        log::info!("Added networked account {:?} '{}'", account.id, account.name);
        Ok(account)
    }

    /// Remove a networked account with all of its types and schedules.
    /// Returns how many schedules were removed.
    pub fn remove_account(&self, id: i64) -> ScheduleResult<usize> {
        let account = self
            .get(id)?
            .ok_or_else(|| ScheduleError::not_found("account", id))?;
        if account.is_local() {
            return Err(ScheduleError::PermissionDenied(
                "the local account cannot be removed".into(),
            ));
        }

        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM schedules
             WHERE type_id IN (SELECT id FROM schedule_types WHERE account_id = ?1)",
            [id],
        )?;
        tx.execute("DELETE FROM schedule_types WHERE account_id = ?1", [id])?;
        tx.execute("DELETE FROM accounts WHERE id = ?1", [id])?;
        tx.commit()?;

        log::info!("Removed account {} and {} schedule(s)", id, removed);
        Ok(removed)
    }

    pub fn get(&self, id: i64) -> ScheduleResult<Option<Account>> {
        let result = self.conn.query_row(
            "SELECT id, name, kind, created_at FROM accounts WHERE id = ?1",
            [id],
            map_account_row,
        );

        match result {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All accounts, local first.
    pub fn list(&self) -> ScheduleResult<Vec<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, kind, created_at FROM accounts
             ORDER BY kind = 'local' DESC, id ASC",
        )?;

        let accounts = stmt
            .query_map([], map_account_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(accounts)
    }

    pub fn local(&self) -> ScheduleResult<Option<Account>> {
        self.find_by_kind(AccountKind::Local)
    }

    fn find_by_kind(&self, kind: AccountKind) -> ScheduleResult<Option<Account>> {
        let result = self.conn.query_row(
            "SELECT id, name, kind, created_at FROM accounts WHERE kind = ?1",
            [kind.as_str()],
            map_account_row,
        );

        match result {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn insert(conn: &Connection, mut account: Account) -> ScheduleResult<Account> {
    let now = Local::now();
    conn.execute(
        "INSERT INTO accounts (name, kind, created_at) VALUES (?1, ?2, ?3)",
        params![account.name, account.kind.as_str(), now.to_rfc3339()],
    )?;

    account.id = Some(conn.last_insert_rowid());
    account.created_at = Some(now);
    Ok(account)
}

fn map_account_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    let kind: String = row.get(2)?;
    let kind = AccountKind::from_db(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown account kind '{}'", kind).into(),
        )
    })?;

    Ok(Account {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        kind,
        created_at: Some(to_local_datetime(row.get(3)?)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedule::Schedule;
    use crate::models::schedule_type::ScheduleType;
    use crate::services::database::Database;
    use crate::services::schedule::ScheduleService;
    use chrono::Duration;

    fn setup_test_db() -> Database {
        let db = Database::in_memory().unwrap();
        db.initialize_schema().unwrap();
        db
    }

    #[test]
    fn test_ensure_local_is_idempotent() {
        let db = setup_test_db();
        let service = AccountService::new(db.connection());

        let first = service.ensure_local().unwrap();
        let second = service.ensure_local().unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(service.list().unwrap().len(), 1);

        let types = ScheduleTypeService::new(db.connection())
            .list_for_account(first.id.unwrap())
            .unwrap();
        assert_eq!(types.len(), 4);
    }

    #[test]
    fn test_single_union_account() {
        let db = setup_test_db();
        let service = AccountService::new(db.connection());
        service.ensure_local().unwrap();

        let union = service.add_union_account("Work sync").unwrap();
        assert_eq!(union.kind, AccountKind::Union);

        let result = service.add_union_account("Another");
        assert!(matches!(
            result,
            Err(ScheduleError::CapacityExceeded { limit: 1, .. })
        ));
        assert_eq!(service.list().unwrap().len(), 2);
        assert!(service.list().unwrap()[0].is_local());
    }

    #[test]
    fn test_local_account_cannot_be_removed() {
        let db = setup_test_db();
        let service = AccountService::new(db.connection());
        let local = service.ensure_local().unwrap();

        let result = service.remove_account(local.id.unwrap());
        assert!(matches!(result, Err(ScheduleError::PermissionDenied(_))));
        assert!(matches!(
            service.remove_account(999),
            Err(ScheduleError::NotFound { entity: "account", .. })
        ));
    }

    #[test]
    fn test_remove_union_account_cascades() {
        let db = setup_test_db();
        let service = AccountService::new(db.connection());
        service.ensure_local().unwrap();
        let union_id = service.add_union_account("Shared").unwrap().id.unwrap();

        let types = ScheduleTypeService::new(db.connection());
        let type_id = types
            .create(ScheduleType::new(union_id, "Team", "#00AAFF"))
            .unwrap()
            .id
            .unwrap();

        let start = Local::now();
        let schedules = ScheduleService::new(db.connection());
        schedules
            .create(Schedule::new(type_id, "Sync", start, start + Duration::hours(1)).unwrap())
            .unwrap();

        assert_eq!(service.remove_account(union_id).unwrap(), 1);
        assert!(service.get(union_id).unwrap().is_none());
        assert!(types.get(type_id).unwrap().is_none());
        assert!(schedules.list_by_type(type_id).unwrap().is_empty());
    }
}
