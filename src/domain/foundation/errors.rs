//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    UnknownDeliverableKind,

    // Not found errors
    CycleNotFound,
    StatusNotFound,
    DeliverableNotFound,

    // State errors
    StepOrderViolation,

    // Infrastructure errors
    DatabaseError,
    CalendarError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::UnknownDeliverableKind => "UNKNOWN_DELIVERABLE_KIND",
            ErrorCode::CycleNotFound => "CYCLE_NOT_FOUND",
            ErrorCode::StatusNotFound => "STATUS_NOT_FOUND",
            ErrorCode::DeliverableNotFound => "DELIVERABLE_NOT_FOUND",
            ErrorCode::StepOrderViolation => "STEP_ORDER_VIOLATION",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::CalendarError => "CALENDAR_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a database error from an underlying failure.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Creates a remote-calendar error from an underlying failure.
    pub fn calendar(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CalendarError, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_code_and_message() {
        let err = DomainError::new(ErrorCode::CycleNotFound, "Cycle not found");
        assert_eq!(format!("{}", err), "[CYCLE_NOT_FOUND] Cycle not found");
    }

    #[test]
    fn with_detail_accumulates() {
        let err = DomainError::new(ErrorCode::StepOrderViolation, "wrong step")
            .with_detail("current", "assessment")
            .with_detail("attempted", "staff_meeting");

        assert_eq!(err.details.get("current"), Some(&"assessment".to_string()));
        assert_eq!(err.details.get("attempted"), Some(&"staff_meeting".to_string()));
    }

    #[test]
    fn error_code_display_is_screaming_snake() {
        assert_eq!(format!("{}", ErrorCode::StepOrderViolation), "STEP_ORDER_VIOLATION");
        assert_eq!(format!("{}", ErrorCode::CalendarError), "CALENDAR_ERROR");
    }

    #[test]
    fn helpers_set_expected_codes() {
        assert_eq!(DomainError::database("boom").code, ErrorCode::DatabaseError);
        assert_eq!(DomainError::calendar("down").code, ErrorCode::CalendarError);
    }
}
