// Service module exports
// Persistence over SQLite plus the pure expansion and query engine

pub mod account;
pub mod database;
pub mod icalendar;
pub mod query;
pub mod reminder;
pub mod schedule;
pub mod schedule_type;
pub mod settings;
