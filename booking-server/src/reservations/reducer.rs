//! Event reducer - applies events to snapshots
//!
//! The single place where event payloads mutate reservation state. Replaying
//! a reservation's event stream through [`apply`] in sequence order rebuilds
//! its snapshot exactly.

use shared::reservation::{EventPayload, ReservationEvent, ReservationSnapshot, ReservationStatus};

/// Apply one event to a snapshot
pub fn apply(snapshot: &mut ReservationSnapshot, event: &ReservationEvent) {
    match &event.payload {
        EventPayload::Booked {
            account_id,
            team_member_id,
            client_id,
            client_user_id,
            service_id,
            source,
            timezone,
            starts_at,
            ends_at,
            duration_minutes,
            buffer_minutes,
            initial_status,
            payment_policy,
            rescheduled_from_id,
            internal_notes,
            client_notes,
        } => {
            snapshot.account_id = *account_id;
            snapshot.team_member_id = *team_member_id;
            snapshot.client_id = *client_id;
            snapshot.client_user_id = *client_user_id;
            snapshot.service_id = *service_id;
            snapshot.source = *source;
            snapshot.timezone = timezone.clone();
            snapshot.starts_at = *starts_at;
            snapshot.ends_at = *ends_at;
            snapshot.duration_minutes = *duration_minutes;
            snapshot.buffer_minutes = *buffer_minutes;
            snapshot.status = *initial_status;
            snapshot.payment_policy = payment_policy.clone();
            snapshot.rescheduled_from_id = rescheduled_from_id.clone();
            snapshot.internal_notes = internal_notes.clone();
            snapshot.client_notes = client_notes.clone();
            snapshot.created_by_user_id = event.actor_id;
            snapshot.created_at = event.timestamp;
        }

        EventPayload::Confirmed {} => {
            snapshot.status = ReservationStatus::Confirmed;
        }

        EventPayload::ServiceStarted {} => {
            snapshot.status = ReservationStatus::InService;
        }

        EventPayload::Completed { .. } => {
            snapshot.status = ReservationStatus::Completed;
        }

        EventPayload::Cancelled {
            reason,
            cancelled_by_user_id,
            superseded_by_id,
            ..
        } => {
            snapshot.status = ReservationStatus::Cancelled;
            snapshot.cancelled_at = Some(event.timestamp);
            snapshot.cancel_reason = reason.clone();
            snapshot.cancelled_by_user_id = Some(*cancelled_by_user_id);
            snapshot.superseded_by_id = superseded_by_id.clone();
        }

        EventPayload::NoShowMarked { .. } => {
            snapshot.status = ReservationStatus::NoShow;
        }

        EventPayload::TicketIssued { ticket } => {
            snapshot.queue_ticket = Some(ticket.clone());
        }

        EventPayload::TicketPreCalled { .. } => {
            if let Some(ticket) = snapshot.queue_ticket.as_mut() {
                ticket.pre_called_at = Some(event.timestamp);
            }
        }

        EventPayload::TicketCalled {
            grace_expires_at,
        } => {
            if let Some(ticket) = snapshot.queue_ticket.as_mut() {
                ticket.called_at = Some(event.timestamp);
                ticket.grace_expires_at = Some(*grace_expires_at);
            }
        }

        EventPayload::TicketCheckedIn {} => {
            if let Some(ticket) = snapshot.queue_ticket.as_mut() {
                ticket.checked_in_at = Some(event.timestamp);
                ticket.grace_expires_at = None;
            }
        }

        EventPayload::TicketRequeued { enqueued_at } => {
            if let Some(ticket) = snapshot.queue_ticket.as_mut() {
                ticket.enqueued_at = *enqueued_at;
                ticket.pre_called_at = None;
                ticket.called_at = None;
                ticket.grace_expires_at = None;
                ticket.requeues += 1;
            }
        }
    }

    snapshot.updated_at = event.timestamp;
    snapshot.last_sequence = event.sequence;
}

/// Rebuild a snapshot from its full event stream (verification/debugging)
pub fn rebuild(reservation_id: &str, events: &[ReservationEvent]) -> ReservationSnapshot {
    let mut snapshot = ReservationSnapshot::new(reservation_id.to_string());
    for event in events {
        apply(&mut snapshot, event);
    }
    snapshot
}
