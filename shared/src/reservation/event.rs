//! Reservation events - immutable facts recorded after each operation
//!
//! Events are the authoritative record: snapshots are derived by applying
//! them in sequence order. External collaborators (notifier, billing)
//! subscribe to the engine's broadcast feed of these events and act on the
//! pre-call and fee-due payloads; delivery and charging stay outside the
//! engine.

use super::snapshot::QueueTicket;
use super::types::{Actor, ActorRole, PaymentPolicy, ReservationSource, ReservationStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reservation event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (authoritative ordering for state evolution)
    pub sequence: u64,
    /// Reservation this event belongs to
    pub reservation_id: String,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Actor who triggered this event
    pub actor_id: i64,
    pub actor_role: ActorRole,
    /// Actor name (snapshot for audit)
    pub actor_name: String,
    /// Event type
    pub event_type: ReservationEventType,
    /// Event payload
    pub payload: EventPayload,
}

impl ReservationEvent {
    pub fn new(
        sequence: u64,
        reservation_id: String,
        actor: &Actor,
        timestamp: i64,
        event_type: ReservationEventType,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: crate::util::new_id(),
            sequence,
            reservation_id,
            timestamp,
            actor_id: actor.user_id,
            actor_role: actor.role,
            actor_name: actor.name.clone(),
            event_type,
            payload,
        }
    }
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationEventType {
    // Lifecycle
    Booked,
    Confirmed,
    ServiceStarted,
    Completed,
    Cancelled,
    NoShowMarked,

    // Queue
    TicketIssued,
    TicketPreCalled,
    TicketCalled,
    TicketCheckedIn,
    TicketRequeued,
}

impl std::fmt::Display for ReservationEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Booked => "BOOKED",
            Self::Confirmed => "CONFIRMED",
            Self::ServiceStarted => "SERVICE_STARTED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::NoShowMarked => "NO_SHOW_MARKED",
            Self::TicketIssued => "TICKET_ISSUED",
            Self::TicketPreCalled => "TICKET_PRE_CALLED",
            Self::TicketCalled => "TICKET_CALLED",
            Self::TicketCheckedIn => "TICKET_CHECKED_IN",
            Self::TicketRequeued => "TICKET_REQUEUED",
        };
        f.write_str(s)
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Lifecycle ==========
    Booked {
        account_id: i64,
        team_member_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        client_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        client_user_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        service_id: Option<i64>,
        source: ReservationSource,
        /// Business timezone snapshot (IANA name)
        timezone: String,
        starts_at: i64,
        ends_at: i64,
        duration_minutes: i32,
        /// Buffer snapshot at booking time
        buffer_minutes: i32,
        initial_status: ReservationStatus,
        payment_policy: PaymentPolicy,
        #[serde(skip_serializing_if = "Option::is_none")]
        rescheduled_from_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        internal_notes: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        client_notes: Option<String>,
    },

    Confirmed {},

    ServiceStarted {},

    Completed {
        /// Deposit to settle on the invoice, when one was required
        #[serde(skip_serializing_if = "Option::is_none")]
        deposit_due: Option<Decimal>,
    },

    Cancelled {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        cancelled_by_user_id: i64,
        /// Set when the cancellation is half of a reschedule
        #[serde(skip_serializing_if = "Option::is_none")]
        superseded_by_id: Option<String>,
        /// Whether a captured deposit becomes refundable
        deposit_refundable: bool,
    },

    NoShowMarked {
        /// Fee to charge via the billing collaborator, when enabled
        #[serde(skip_serializing_if = "Option::is_none")]
        fee_due: Option<Decimal>,
    },

    // ========== Queue ==========
    TicketIssued {
        ticket: QueueTicket,
    },

    /// Pre-call notification signal: `ahead` entries remain before this
    /// ticket. Delivery is the notifier collaborator's job.
    TicketPreCalled {
        ahead: u32,
    },

    TicketCalled {
        grace_expires_at: i64,
    },

    TicketCheckedIn {},

    /// Ticket sent to the tail of its tier (grace expired without no-show
    /// escalation)
    TicketRequeued {
        enqueued_at: i64,
    },
}
