// Settings module
// Engine configuration loaded from config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::schedule_type::MAX_TYPES_PER_ACCOUNT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite file; defaults to the platform data directory
    pub database_path: Option<PathBuf>,
    /// Months either side of "now" searched by keyword queries
    pub search_window_months: u32,
    /// Per-account schedule type limit (at most 20)
    pub max_schedule_types: usize,
    /// Default number of upcoming occurrences listed
    pub upcoming_count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: None,
            search_window_months: 6,
            max_schedule_types: MAX_TYPES_PER_ACCOUNT,
            upcoming_count: 10,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=120).contains(&self.search_window_months) {
            return Err("search_window_months must be between 1 and 120".to_string());
        }

        if !(1..=MAX_TYPES_PER_ACCOUNT).contains(&self.max_schedule_types) {
            return Err(format!(
                "max_schedule_types must be between 1 and {}",
                MAX_TYPES_PER_ACCOUNT
            ));
        }

        if self.upcoming_count == 0 {
            return Err("upcoming_count must be at least 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.search_window_months, 6);
        assert_eq!(settings.max_schedule_types, 20);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_type_limit_cannot_exceed_twenty() {
        let settings = Settings {
            max_schedule_types: 21,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
