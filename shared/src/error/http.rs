//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound | Self::ReservationNotFound | Self::TicketNotFound => {
                StatusCode::NOT_FOUND
            }

            // 409 Conflict (caller should retry with a fresh slot query)
            Self::SlotUnavailable
            | Self::ResourceBusy
            | Self::InvalidStateTransition
            | Self::InvalidQueueAction
            | Self::StorageBusy => StatusCode::CONFLICT,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::StaffOnly
            | Self::ClientCancelDisabled
            | Self::ClientRescheduleDisabled => StatusCode::FORBIDDEN,

            // 422 Unprocessable Entity (business-rule rejections)
            Self::ValidationFailed
            | Self::NoticeWindowViolated
            | Self::AdvanceWindowExceeded
            | Self::InvalidTimeRange
            | Self::SpansMultipleDays
            | Self::OutsideAvailability
            | Self::CutoffExceeded
            | Self::QueueDisabled
            | Self::SettingsInvalid => StatusCode::UNPROCESSABLE_ENTITY,

            // 500 Internal Server Error
            Self::InternalError | Self::StorageError | Self::Unknown => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
