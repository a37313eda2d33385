use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    create_accounts_table(conn)?;
    create_schedule_types_table(conn)?;
    create_schedules_table(conn)?;
    create_indexes(conn)?;
    Ok(())
}

fn create_accounts_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('local', 'union')),
            created_at TEXT NOT NULL
        )",
        [],
    )
    .context("Failed to create accounts table")?;

    Ok(())
}

fn create_schedule_types_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schedule_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            color TEXT NOT NULL,
            privilege TEXT NOT NULL DEFAULT 'user',
            is_visible INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )
    .context("Failed to create schedule_types table")?;

    Ok(())
}

fn create_schedules_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schedules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type_id INTEGER NOT NULL REFERENCES schedule_types(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            location TEXT,
            start_datetime TEXT NOT NULL,
            end_datetime TEXT NOT NULL,
            is_all_day INTEGER NOT NULL DEFAULT 0,
            is_lunar INTEGER NOT NULL DEFAULT 0,
            recurrence_rule TEXT,
            recurrence_exceptions TEXT,
            alarms TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )
    .context("Failed to create schedules table")?;

    Ok(())
}

fn create_indexes(conn: &Connection) -> Result<()> {
    // One account per kind: a single local account and at most one union account.
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_kind ON accounts(kind)",
        [],
    )
    .context("Failed to create accounts index")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_schedule_types_account ON schedule_types(account_id)",
        [],
    )
    .context("Failed to create schedule_types index")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_schedules_type ON schedules(type_id)",
        [],
    )
    .context("Failed to create schedules index")?;

    Ok(())
}
