//! Error type shared by the schedule engine and its services.

use thiserror::Error;

/// Result alias for schedule operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Errors surfaced by the store, the recurrence engine and the type lifecycle.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Entity lookup by identifier failed
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A per-account limit was reached
    #[error("{resource} limit of {limit} reached")]
    CapacityExceeded { resource: &'static str, limit: usize },

    /// The target is a system entity or otherwise read-only
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Query window or schedule times are out of order
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Recurrence rule cannot be honoured
    #[error("Invalid recurrence: {0}")]
    InvalidRecurrence(String),

    /// Local validation failure (empty title, bad color, ...)
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScheduleError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn capacity(resource: &'static str, limit: usize) -> Self {
        Self::CapacityExceeded { resource, limit }
    }

    /// True for errors caused by the caller's input rather than the store.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Serialization(_))
    }
}
