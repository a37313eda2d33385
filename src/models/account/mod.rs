//! Account model.
//!
//! The local account always exists; a networked ("union") account may be
//! added once.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    Local,
    Union,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Local => "local",
            AccountKind::Union => "union",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "local" => Some(AccountKind::Local),
            "union" => Some(AccountKind::Union),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Option<i64>,
    pub name: String,
    pub kind: AccountKind,
    pub created_at: Option<DateTime<Local>>,
}

impl Account {
    pub fn local() -> Self {
        Self {
            id: None,
            name: "Local".to_string(),
            kind: AccountKind::Local,
            created_at: None,
        }
    }

    pub fn union(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind: AccountKind::Union,
            created_at: None,
        }
    }

    pub fn is_local(&self) -> bool {
        self.kind == AccountKind::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_db_form() {
        for kind in [AccountKind::Local, AccountKind::Union] {
            assert_eq!(AccountKind::from_db(kind.as_str()), Some(kind));
        }
        assert_eq!(AccountKind::from_db("caldav"), None);
    }

    #[test]
    fn test_constructors() {
        assert!(Account::local().is_local());
        let union = Account::union("Work cloud");
        assert!(!union.is_local());
        assert_eq!(union.name, "Work cloud");
    }
}
