// Rust Schedule Library
// Recurrence expansion, schedule queries and their SQLite store

pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{ScheduleError, ScheduleResult};
