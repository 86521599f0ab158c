//! Error handling for OpenHouse
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;
use crate::models::AppointmentKey;

/// Main error type for OpenHouse
#[derive(Error, Debug)]
pub enum OpenHouseError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Appointment {key} already exists")]
    DuplicateKey { key: AppointmentKey },

    #[error("A visitor with email {email} is already registered")]
    AlreadyRegistered { email: String },

    #[error("Appointment not found: {key}")]
    AppointmentNotFound { key: AppointmentKey },

    #[error("Appointment {key} is full")]
    AppointmentFull { key: AppointmentKey },

    #[error("Appointment {key} cannot take {requested} more people ({filled}/{gauge} booked)")]
    CapacityExceeded { key: AppointmentKey, filled: i64, requested: i32, gauge: i32 },

    #[error("School {school} is not allowed on appointment {key}")]
    NotAuthorized { key: AppointmentKey, school: String },

    #[error("Too many slots selected: {selected} (max {max})")]
    TooManySlots { selected: usize, max: u32 },

    #[error("Place not found: {place_id}")]
    PlaceNotFound { place_id: i64 },

    #[error("Schedule not found: {schedule_id}")]
    ScheduleNotFound { schedule_id: i64 },

    #[error("Student not found: {email}")]
    StudentNotFound { email: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for OpenHouse operations
pub type Result<T> = std::result::Result<T, OpenHouseError>;

impl OpenHouseError {
    /// Whether the error is a refusal to show to the visitor rather than a fault
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            OpenHouseError::AlreadyRegistered { .. }
                | OpenHouseError::AppointmentNotFound { .. }
                | OpenHouseError::AppointmentFull { .. }
                | OpenHouseError::CapacityExceeded { .. }
                | OpenHouseError::NotAuthorized { .. }
                | OpenHouseError::TooManySlots { .. }
                | OpenHouseError::InvalidInput(_)
        )
    }

    /// Whether the registration was refused for lack of room
    pub fn is_capacity_error(&self) -> bool {
        matches!(
            self,
            OpenHouseError::AppointmentFull { .. } | OpenHouseError::CapacityExceeded { .. }
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            OpenHouseError::Database(_) => ErrorSeverity::Critical,
            OpenHouseError::Migration(_) => ErrorSeverity::Critical,
            OpenHouseError::Settings(_) => ErrorSeverity::Critical,
            OpenHouseError::Config(_) => ErrorSeverity::Critical,
            OpenHouseError::DuplicateKey { .. } => ErrorSeverity::Warning,
            OpenHouseError::AppointmentFull { .. } => ErrorSeverity::Warning,
            OpenHouseError::CapacityExceeded { .. } => ErrorSeverity::Warning,
            err if err.is_user_facing() => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_errors_are_user_facing_warnings() {
        let err = OpenHouseError::CapacityExceeded {
            key: AppointmentKey::new(1, 2),
            filled: 6,
            requested: 6,
            gauge: 10,
        };
        assert!(err.is_user_facing());
        assert!(err.is_capacity_error());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.to_string(), "Appointment 1-2 cannot take 6 more people (6/10 booked)");
    }

    #[test]
    fn test_already_registered_is_not_a_fault() {
        let err = OpenHouseError::AlreadyRegistered { email: "a@b.fr".to_string() };
        assert!(err.is_user_facing());
        assert!(!err.is_capacity_error());
        assert_eq!(err.severity(), ErrorSeverity::Info);
    }

    #[test]
    fn test_duplicate_key_is_internal() {
        let err = OpenHouseError::DuplicateKey { key: AppointmentKey::new(3, 4) };
        assert!(!err.is_user_facing());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(ErrorSeverity::Critical.to_string(), "CRITICAL");
    }
}
