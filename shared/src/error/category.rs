//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Validation errors
/// - 2xxx: Permission errors
/// - 3xxx: Settings errors
/// - 4xxx: Reservation errors
/// - 5xxx: Queue errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Validation errors (1xxx)
    Validation,
    /// Permission errors (2xxx)
    Permission,
    /// Settings errors (3xxx)
    Settings,
    /// Reservation errors (4xxx)
    Reservation,
    /// Queue errors (5xxx)
    Queue,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Validation,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Settings,
            4000..5000 => Self::Reservation,
            5000..6000 => Self::Queue,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Validation => "validation",
            Self::Permission => "permission",
            Self::Settings => "settings",
            Self::Reservation => "reservation",
            Self::Queue => "queue",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
