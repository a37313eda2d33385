// Module exports for models

pub mod account;
pub mod alarm;
pub mod query;
pub mod recurrence;
pub mod schedule;
pub mod schedule_type;
pub mod settings;
