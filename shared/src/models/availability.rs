//! Availability Model
//!
//! Working windows for a bookable resource: recurring weekly windows plus
//! dated exceptions (extra openings or closures). A resource with no stored
//! windows is treated as open all day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Recurring weekly working window (minutes from local midnight)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyWindow {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    pub start_minute: u16,
    pub end_minute: u16,
}

impl WeeklyWindow {
    /// A window is usable only if it has positive length within one day.
    pub fn is_valid(&self) -> bool {
        self.day_of_week <= 6 && self.start_minute < self.end_minute && self.end_minute <= 1440
    }
}

/// Exception kind: extra opening or a closure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    Open,
    Closed,
}

/// Dated availability exception
///
/// Without a window the exception covers the whole day (full-day closure or
/// full-day opening).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityException {
    pub date: NaiveDate,
    pub kind: ExceptionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_minute: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_minute: Option<u16>,
}

/// Stored availability row, one per (account, team-member)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AvailabilityRow {
    pub account_id: i64,
    pub team_member_id: i64,
    #[serde(default)]
    pub weekly: Vec<WeeklyWindow>,
    #[serde(default)]
    pub exceptions: Vec<AvailabilityException>,
    #[serde(default)]
    pub updated_at: i64,
}
