//! Engine error taxonomy
//!
//! One variant per recovery path: validation errors are re-promptable,
//! conflicts are retry-with-fresh-slot, cutoff violations surface to the end
//! user, invalid transitions are usage errors, permission errors are final.
//! The engine never retries internally.

use shared::error::ErrorCode;
use shared::reservation::ReservationStatus;
use thiserror::Error;

use crate::db::StorageError;
use crate::scheduling::WindowViolation;
use crate::utils::time::millis_to_rfc3339;

pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{message}")]
    Validation { code: ErrorCode, message: String },

    #[error("Selected slot is no longer available: {0}")]
    Conflict(String),

    #[error("Resource is busy: {0}")]
    ResourceBusy(String),

    #[error("Cancellation cutoff passed (cutoff at {cutoff_at})")]
    CutoffExceeded {
        /// Unix millis of `starts_at - cutoff_hours`
        cutoff_at: i64,
    },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error("{message}")]
    Permission { code: ErrorCode, message: String },

    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),

    #[error("Queue mode disabled: {0}")]
    QueueDisabled(String),

    #[error("No queue ticket on reservation: {0}")]
    TicketNotFound(String),

    #[error("Invalid queue action: {0}")]
    InvalidQueueAction(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl EngineError {
    // ==================== Convenience constructors ====================

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
        }
    }

    pub fn validation_with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn staff_only(operation: &str) -> Self {
        Self::Permission {
            code: ErrorCode::StaffOnly,
            message: format!("Operation '{operation}' is restricted to staff"),
        }
    }

    pub fn permission(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Permission {
            code,
            message: message.into(),
        }
    }

    pub fn transition(from: ReservationStatus, to: ReservationStatus) -> Self {
        Self::InvalidStateTransition { from, to }
    }

    /// Unified error code for wire responses
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::Conflict(_) => ErrorCode::SlotUnavailable,
            Self::ResourceBusy(_) => ErrorCode::ResourceBusy,
            Self::CutoffExceeded { .. } => ErrorCode::CutoffExceeded,
            Self::InvalidStateTransition { .. } => ErrorCode::InvalidStateTransition,
            Self::Permission { code, .. } => *code,
            Self::ReservationNotFound(_) => ErrorCode::ReservationNotFound,
            Self::QueueDisabled(_) => ErrorCode::QueueDisabled,
            Self::TicketNotFound(_) => ErrorCode::TicketNotFound,
            Self::InvalidQueueAction(_) => ErrorCode::InvalidQueueAction,
            Self::Storage(e) => classify_storage_error(e),
        }
    }
}

impl From<WindowViolation> for EngineError {
    fn from(violation: WindowViolation) -> Self {
        match violation {
            WindowViolation::TooSoon { earliest } => Self::Validation {
                code: ErrorCode::NoticeWindowViolated,
                message: format!(
                    "Start time is inside the minimum notice window (earliest {})",
                    millis_to_rfc3339(earliest)
                ),
            },
            WindowViolation::TooFar { horizon } => Self::Validation {
                code: ErrorCode::AdvanceWindowExceeded,
                message: format!(
                    "Start time is beyond the booking horizon ({})",
                    millis_to_rfc3339(horizon)
                ),
            },
        }
    }
}

/// 将存储错误转换为错误码（调用方负责展示）
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    match e {
        StorageError::Serialization(_) => ErrorCode::InternalError,
        StorageError::ReservationNotFound(_) => ErrorCode::ReservationNotFound,
        StorageError::Transaction(_) => ErrorCode::StorageBusy,
        _ => ErrorCode::StorageError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            EngineError::validation("bad").code(),
            ErrorCode::ValidationFailed
        );
        assert_eq!(
            EngineError::conflict("taken").code(),
            ErrorCode::SlotUnavailable
        );
        assert_eq!(
            EngineError::CutoffExceeded { cutoff_at: 0 }.code(),
            ErrorCode::CutoffExceeded
        );
        assert_eq!(
            EngineError::transition(ReservationStatus::Completed, ReservationStatus::Cancelled)
                .code(),
            ErrorCode::InvalidStateTransition
        );
        assert_eq!(
            EngineError::staff_only("complete").code(),
            ErrorCode::StaffOnly
        );
    }

    #[test]
    fn test_transition_error_names_both_states() {
        let message =
            EngineError::transition(ReservationStatus::Completed, ReservationStatus::Cancelled)
                .to_string();
        assert!(message.contains("COMPLETED"));
        assert!(message.contains("CANCELLED"));
    }

    #[test]
    fn test_window_violation_conversion() {
        let err: EngineError = WindowViolation::TooFar { horizon: 0 }.into();
        assert_eq!(err.code(), ErrorCode::AdvanceWindowExceeded);
        let err: EngineError = WindowViolation::TooSoon { earliest: 0 }.into();
        assert_eq!(err.code(), ErrorCode::NoticeWindowViolated);
    }
}
