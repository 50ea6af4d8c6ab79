//! Unified error codes for the booking engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Validation errors
//! - 2xxx: Permission errors
//! - 3xxx: Settings errors
//! - 4xxx: Reservation errors
//! - 5xxx: Queue errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Validation ====================
    /// Validation failed
    ValidationFailed = 1001,
    /// Requested start is before the minimum notice window
    NoticeWindowViolated = 1002,
    /// Requested start is beyond the maximum advance window
    AdvanceWindowExceeded = 1003,
    /// End time is not after start time
    InvalidTimeRange = 1004,
    /// Reservation would span multiple business days
    SpansMultipleDays = 1005,
    /// Requested start is outside configured availability
    OutsideAvailability = 1006,
    /// Unsupported action keyword
    UnknownAction = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Operation restricted to staff actors
    StaffOnly = 2002,
    /// Client cancellation disabled for this account
    ClientCancelDisabled = 2003,
    /// Client reschedule disabled for this account
    ClientRescheduleDisabled = 2004,

    // ==================== 3xxx: Settings ====================
    /// Settings row rejected (bad override values)
    SettingsInvalid = 3001,

    // ==================== 4xxx: Reservation ====================
    /// Reservation not found
    ReservationNotFound = 4001,
    /// Slot conflicts with an existing reservation (buffers applied)
    SlotUnavailable = 4002,
    /// Resource lock could not be acquired in time
    ResourceBusy = 4003,
    /// Transition not allowed from the current status
    InvalidStateTransition = 4004,
    /// Client-initiated change attempted past the cancellation cutoff
    CutoffExceeded = 4005,

    // ==================== 5xxx: Queue ====================
    /// Queue mode is not enabled for this account
    QueueDisabled = 5001,
    /// Queue ticket not found on the reservation
    TicketNotFound = 5002,
    /// Queue action not valid for the ticket's current state
    InvalidQueueAction = 5003,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Storage layer failure
    StorageError = 9002,
    /// Storage busy, retry later
    StorageBusy = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",

            // Validation
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NoticeWindowViolated => "Start time is inside the minimum notice window",
            ErrorCode::AdvanceWindowExceeded => "Start time is beyond the booking horizon",
            ErrorCode::InvalidTimeRange => "End time must be after start time",
            ErrorCode::SpansMultipleDays => "Reservations cannot span multiple days",
            ErrorCode::OutsideAvailability => "Start time is outside configured availability",
            ErrorCode::UnknownAction => "Unsupported action",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::StaffOnly => "Operation restricted to staff",
            ErrorCode::ClientCancelDisabled => "Client cancellation is disabled",
            ErrorCode::ClientRescheduleDisabled => "Client reschedule is disabled",

            // Settings
            ErrorCode::SettingsInvalid => "Settings values rejected",

            // Reservation
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::SlotUnavailable => "Selected slot is no longer available",
            ErrorCode::ResourceBusy => "Resource is busy, retry shortly",
            ErrorCode::InvalidStateTransition => "Transition not allowed from current status",
            ErrorCode::CutoffExceeded => "Cancellation cutoff has passed",

            // Queue
            ErrorCode::QueueDisabled => "Queue mode is disabled for this account",
            ErrorCode::TicketNotFound => "Queue ticket not found",
            ErrorCode::InvalidQueueAction => "Queue action not valid for current ticket state",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StorageError => "Storage failure",
            ErrorCode::StorageBusy => "Storage busy",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when a u16 value does not map to a known [`ErrorCode`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            1 => ErrorCode::Unknown,
            3 => ErrorCode::NotFound,
            5 => ErrorCode::InvalidRequest,
            1001 => ErrorCode::ValidationFailed,
            1002 => ErrorCode::NoticeWindowViolated,
            1003 => ErrorCode::AdvanceWindowExceeded,
            1004 => ErrorCode::InvalidTimeRange,
            1005 => ErrorCode::SpansMultipleDays,
            1006 => ErrorCode::OutsideAvailability,
            1007 => ErrorCode::UnknownAction,
            2001 => ErrorCode::PermissionDenied,
            2002 => ErrorCode::StaffOnly,
            2003 => ErrorCode::ClientCancelDisabled,
            2004 => ErrorCode::ClientRescheduleDisabled,
            3001 => ErrorCode::SettingsInvalid,
            4001 => ErrorCode::ReservationNotFound,
            4002 => ErrorCode::SlotUnavailable,
            4003 => ErrorCode::ResourceBusy,
            4004 => ErrorCode::InvalidStateTransition,
            4005 => ErrorCode::CutoffExceeded,
            5001 => ErrorCode::QueueDisabled,
            5002 => ErrorCode::TicketNotFound,
            5003 => ErrorCode::InvalidQueueAction,
            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::StorageError,
            9003 => ErrorCode::StorageBusy,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
