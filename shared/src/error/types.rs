//! Error wire shapes

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// The `{code, message}` body returned for every failed request
///
/// ```json
/// { "code": 4002, "message": "Selected slot is no longer available" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Numeric error code (see [`ErrorCode`])
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl ErrorBody {
    /// Create a body with the default message for the code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
        }
    }

    /// Create a body with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
