//! Schedule type model.
//!
//! Every schedule belongs to exactly one type, and every type belongs to one
//! account. System types are seeded with the local account and are
//! read-only apart from their color and visibility.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on types held by one account.
pub const MAX_TYPES_PER_ACCOUNT: usize = 20;
/// Longest display name, counted in characters.
pub const MAX_NAME_CHARS: usize = 20;

/// Who owns a schedule type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypePrivilege {
    System,
    User,
}

impl TypePrivilege {
    pub fn as_str(self) -> &'static str {
        match self {
            TypePrivilege::System => "system",
            TypePrivilege::User => "user",
        }
    }

    pub fn from_db(value: &str) -> Self {
        if value == "system" {
            TypePrivilege::System
        } else {
            TypePrivilege::User
        }
    }
}

/// A category of schedules with a display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleType {
    pub id: Option<i64>,
    pub account_id: i64,
    /// Display name (1-20 characters)
    pub name: String,
    /// Hex color code (e.g. "#3B82F6")
    pub color: String,
    pub privilege: TypePrivilege,
    pub visible: bool,
}

impl ScheduleType {
    /// A user-owned, visible type.
    pub fn new(account_id: i64, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: None,
            account_id,
            name: name.into(),
            color: color.into(),
            privilege: TypePrivilege::User,
            visible: true,
        }
    }

    pub fn system(account_id: i64, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            privilege: TypePrivilege::System,
            ..Self::new(account_id, name, color)
        }
    }

    pub fn is_system(&self) -> bool {
        self.privilege == TypePrivilege::System
    }

    pub fn validate(&self) -> Result<(), TypeValidationError> {
        validate_name(&self.name)?;
        validate_color(&self.color)
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), TypeValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TypeValidationError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(TypeValidationError::NameTooLong);
    }
    Ok(())
}

pub(crate) fn validate_color(color: &str) -> Result<(), TypeValidationError> {
    if is_valid_hex_color(color) {
        Ok(())
    } else {
        Err(TypeValidationError::InvalidColor)
    }
}

/// Validation errors for ScheduleType.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeValidationError {
    EmptyName,
    NameTooLong,
    InvalidColor,
}

impl fmt::Display for TypeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Schedule type name cannot be empty"),
            Self::NameTooLong => write!(f, "Schedule type name must be {} characters or less", MAX_NAME_CHARS),
            Self::InvalidColor => write!(f, "Invalid color format (use hex like #FF0000)"),
        }
    }
}

impl std::error::Error for TypeValidationError {}

fn is_valid_hex_color(color: &str) -> bool {
    let Some(hex) = color.trim().strip_prefix('#') else {
        return false;
    };
    // Accept 3, 6, or 8 character hex codes
    matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// System types seeded into the local account.
pub fn default_types(account_id: i64) -> Vec<ScheduleType> {
    vec![
        ScheduleType::system(account_id, "Work", "#3B82F6"),
        ScheduleType::system(account_id, "Life", "#10B981"),
        ScheduleType::system(account_id, "Other", "#8B5CF6"),
        ScheduleType::system(account_id, "Festival", "#EF4444"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_new_type_is_user_owned() {
        let t = ScheduleType::new(1, "Study", "#FFAA00");
        assert!(!t.is_system());
        assert!(t.visible);
        assert!(t.validate().is_ok());
    }

    #[test_case("", "#FFF", TypeValidationError::EmptyName ; "empty name")]
    #[test_case(&"x".repeat(21), "#FFF", TypeValidationError::NameTooLong ; "long name")]
    #[test_case(&"日".repeat(21), "#FFF", TypeValidationError::NameTooLong ; "long wide name")]
    #[test_case("Ok", "red", TypeValidationError::InvalidColor ; "named color")]
    #[test_case("Ok", "#GGGGGG", TypeValidationError::InvalidColor ; "bad hex")]
    fn test_validation_errors(name: &str, color: &str, expected: TypeValidationError) {
        assert_eq!(ScheduleType::new(1, name, color).validate(), Err(expected));
    }

    #[test_case(&"x".repeat(20) ; "ascii")]
    #[test_case(&"日".repeat(20) ; "wide")]
    fn test_name_at_limit_is_accepted(name: &str) {
        assert!(ScheduleType::new(1, name, "#FFF").validate().is_ok());
    }

    #[test]
    fn test_default_types_are_system() {
        let defaults = default_types(9);
        assert_eq!(defaults.len(), 4);
        assert!(defaults.iter().all(|t| t.is_system() && t.account_id == 9));
        assert!(defaults.iter().all(|t| t.validate().is_ok()));
    }

    #[test]
    fn test_privilege_db_form() {
        assert_eq!(TypePrivilege::from_db(TypePrivilege::System.as_str()), TypePrivilege::System);
        assert_eq!(TypePrivilege::from_db("anything"), TypePrivilege::User);
    }
}
