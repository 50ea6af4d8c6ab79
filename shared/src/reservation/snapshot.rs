//! Reservation snapshot - computed state from the event stream
//!
//! Snapshots are the read model: every event is applied to the stored
//! snapshot inside the same transaction that persists the event.

use super::types::{PaymentPolicy, QueueTier, ReservationSource, ReservationStatus};
use serde::{Deserialize, Serialize};

/// Live queue state attached to a reservation when queue mode is active
///
/// Strongly typed on purpose: the original kept this in an open metadata
/// bag, which made the grace invariants uncheckable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueTicket {
    /// Display number, e.g. "T-0612-041"
    pub ticket_number: String,
    pub tier: QueueTier,
    /// FIFO anchor within the tier (Unix millis); re-queueing moves it
    pub enqueued_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_called_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub called_at: Option<i64>,
    /// Deadline for check-in after being called
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_in_at: Option<i64>,
    /// Times the ticket was sent back to the tail of its tier
    #[serde(default)]
    pub requeues: u32,
}

impl QueueTicket {
    pub fn new(ticket_number: String, tier: QueueTier, enqueued_at: i64) -> Self {
        Self {
            ticket_number,
            tier,
            enqueued_at,
            pre_called_at: None,
            called_at: None,
            grace_expires_at: None,
            checked_in_at: None,
            requeues: 0,
        }
    }

    /// Waiting tickets can be called; called tickets are waiting on check-in
    pub const fn is_called(&self) -> bool {
        self.called_at.is_some() && self.checked_in_at.is_none()
    }
}

/// Reservation snapshot - computed from the event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservationSnapshot {
    /// Reservation ID (assigned by server)
    pub reservation_id: String,
    pub account_id: i64,
    /// The bookable resource (team member)
    pub team_member_id: i64,
    /// Internal customer record, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i64>,
    /// Authenticated portal user, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<i64>,
    pub status: ReservationStatus,
    pub source: ReservationSource,
    /// Business timezone snapshot (IANA name)
    pub timezone: String,
    /// Start (Unix millis, UTC)
    pub starts_at: i64,
    /// End (Unix millis, UTC); always starts_at + duration
    pub ends_at: i64,
    pub duration_minutes: i32,
    /// Buffer snapshot at booking time; later settings changes do not
    /// retroactively alter existing reservations
    pub buffer_minutes: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by_user_id: Option<i64>,
    /// Back-reference to the reservation this one supersedes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescheduled_from_id: Option<String>,
    /// Forward reference set on a cancelled original when a reschedule
    /// produced a successor (distinguishes reschedule from plain cancel)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded_by_id: Option<String>,
    /// Deposit / no-show fee policy captured at booking time
    pub payment_policy: PaymentPolicy,
    /// Live queue state (only when queue mode was active at enqueue)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_ticket: Option<QueueTicket>,
    pub created_by_user_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    /// Last applied event sequence
    pub last_sequence: u64,
}

impl ReservationSnapshot {
    /// Create an empty snapshot shell; real fields arrive with the Booked
    /// event through the reducer.
    pub fn new(reservation_id: String) -> Self {
        Self {
            reservation_id,
            account_id: 0,
            team_member_id: 0,
            client_id: None,
            client_user_id: None,
            service_id: None,
            status: ReservationStatus::Requested,
            source: ReservationSource::Staff,
            timezone: "UTC".to_string(),
            starts_at: 0,
            ends_at: 0,
            duration_minutes: 0,
            buffer_minutes: 0,
            internal_notes: None,
            client_notes: None,
            cancelled_at: None,
            cancel_reason: None,
            cancelled_by_user_id: None,
            rescheduled_from_id: None,
            superseded_by_id: None,
            payment_policy: PaymentPolicy::default(),
            queue_ticket: None,
            created_by_user_id: 0,
            created_at: 0,
            updated_at: 0,
            last_sequence: 0,
        }
    }

    /// True while the reservation occupies the resource's calendar
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// The interval this reservation blocks on its resource once its own
    /// buffer is applied: `[starts_at - buffer, ends_at + buffer)`.
    pub fn blocked_interval_millis(&self) -> (i64, i64) {
        let buffer_ms = i64::from(self.buffer_minutes) * 60_000;
        (self.starts_at - buffer_ms, self.ends_at + buffer_ms)
    }
}
