//! Shared types for the reservation lifecycle

use crate::models::settings::{ReservationSettings, normalize_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Status
// ============================================================================

/// Reservation status
///
/// Forward path: requested → confirmed → in_service → completed.
/// Side exits cancelled/no_show are reachable from the three active states.
/// completed/cancelled/no_show are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    #[default]
    Requested,
    Confirmed,
    InService,
    Completed,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    /// Statuses that occupy the calendar
    pub const ACTIVE: [ReservationStatus; 3] = [
        ReservationStatus::Requested,
        ReservationStatus::Confirmed,
        ReservationStatus::InService,
    ];

    /// True for statuses that still occupy the resource's calendar
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Requested | Self::Confirmed | Self::InService)
    }

    /// True for terminal statuses (no further transitions)
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Requested => "REQUESTED",
            Self::Confirmed => "CONFIRMED",
            Self::InService => "IN_SERVICE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::NoShow => "NO_SHOW",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Source & Actor
// ============================================================================

/// Where a reservation originated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationSource {
    #[default]
    Staff,
    Client,
    Api,
}

impl ReservationSource {
    /// Initial status for a new booking from this source.
    /// Staff bookings are confirmed directly; client/api bookings await
    /// confirmation.
    pub const fn initial_status(&self) -> ReservationStatus {
        match self {
            Self::Staff => ReservationStatus::Confirmed,
            Self::Client | Self::Api => ReservationStatus::Requested,
        }
    }
}

/// Role of the actor performing an operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Staff,
    Client,
    /// Background tasks (grace sweep, late release)
    System,
}

/// The actor performing an operation (identity resolution is the caller's
/// concern; the engine only needs id + role for audit and permission gates)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Actor {
    pub user_id: i64,
    pub role: ActorRole,
    /// Name snapshot for audit
    pub name: String,
}

impl Actor {
    pub fn staff(user_id: i64, name: impl Into<String>) -> Self {
        Self {
            user_id,
            role: ActorRole::Staff,
            name: name.into(),
        }
    }

    pub fn client(user_id: i64, name: impl Into<String>) -> Self {
        Self {
            user_id,
            role: ActorRole::Client,
            name: name.into(),
        }
    }

    /// The engine itself, for sweep-driven transitions
    pub fn system() -> Self {
        Self {
            user_id: 0,
            role: ActorRole::System,
            name: "system".to_string(),
        }
    }

    pub const fn is_client(&self) -> bool {
        matches!(self.role, ActorRole::Client)
    }

    /// Staff and system actors bypass client-side gates (cutoff, allow flags)
    pub const fn bypasses_client_gates(&self) -> bool {
        matches!(self.role, ActorRole::Staff | ActorRole::System)
    }
}

// ============================================================================
// Queue tier
// ============================================================================

/// Dispatch tier: appointments outrank walk-ins under
/// fifo_with_appointment_priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueTier {
    Appointment,
    WalkIn,
}

impl QueueTier {
    /// Lower dequeues first
    pub const fn dispatch_rank(&self) -> u8 {
        match self {
            Self::Appointment => 0,
            Self::WalkIn => 1,
        }
    }
}

// ============================================================================
// Payment policy snapshot
// ============================================================================

/// Deposit / no-show fee policy captured from resolved settings at booking
/// time. Settings changes never retroactively alter existing reservations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PaymentPolicy {
    pub deposit_required: bool,
    pub deposit_amount: Decimal,
    pub no_show_fee_enabled: bool,
    pub no_show_fee_amount: Decimal,
    /// When the policy was captured (Unix millis)
    pub captured_at: i64,
}

impl PaymentPolicy {
    /// Capture from resolved settings. A required deposit with a zero amount
    /// is meaningless, so flags are gated on positive amounts.
    pub fn from_settings(settings: &ReservationSettings, captured_at: i64) -> Self {
        let deposit_amount = normalize_money(settings.deposit_amount);
        let no_show_fee_amount = normalize_money(settings.no_show_fee_amount);
        Self {
            deposit_required: settings.deposit_required && deposit_amount > Decimal::ZERO,
            deposit_amount,
            no_show_fee_enabled: settings.no_show_fee_enabled
                && no_show_fee_amount > Decimal::ZERO,
            no_show_fee_amount,
            captured_at,
        }
    }
}
