//! Cancel command handler
//!
//! Cancels a reservation. Staff and system actors may cancel any non-terminal
//! reservation; client actors pass the account's allow-flag and the
//! cancellation cutoff. Cancelling exactly at `starts_at - cutoff` is already
//! too late: the gate is strictly `now < starts_at - cutoff_hours`.

use shared::error::ErrorCode;
use shared::reservation::{
    Actor, EventPayload, ReservationEvent, ReservationEventType, ReservationStatus,
};

use super::ActionContext;
use crate::reservations::error::{EngineError, EngineResult};

/// Client-permission gate, parameterized so reschedule can reuse the same
/// cutoff logic with its own allow-flag
#[derive(Debug, Clone, Copy)]
pub struct ClientGate {
    /// `allow_client_cancel` / `allow_client_reschedule`
    pub allowed: bool,
    /// Code reported when the flag is off
    pub denial_code: ErrorCode,
    /// `cancellation_cutoff_hours`; 0 disables the cutoff
    pub cutoff_hours: i32,
}

impl ClientGate {
    /// Enforce the gate for a client actor against a reservation start
    pub fn check(&self, starts_at: i64, now: i64) -> EngineResult<()> {
        if !self.allowed {
            return Err(EngineError::permission(
                self.denial_code,
                self.denial_code.message(),
            ));
        }

        if self.cutoff_hours > 0 {
            let cutoff_at = starts_at - i64::from(self.cutoff_hours) * 3_600_000;
            if now >= cutoff_at {
                return Err(EngineError::CutoffExceeded { cutoff_at });
            }
        }

        Ok(())
    }
}

/// Cancel action
#[derive(Debug, Clone)]
pub struct CancelAction {
    pub reservation_id: String,
    pub reason: Option<String>,
    /// Set when this cancellation is half of a reschedule
    pub superseded_by_id: Option<String>,
    pub gate: ClientGate,
}

impl CancelAction {
    pub fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        actor: &Actor,
    ) -> EngineResult<Vec<ReservationEvent>> {
        let snapshot = ctx.load_snapshot(&self.reservation_id)?;

        if snapshot.status.is_terminal() {
            return Err(EngineError::transition(
                snapshot.status,
                ReservationStatus::Cancelled,
            ));
        }

        if actor.is_client() {
            self.gate.check(snapshot.starts_at, ctx.now)?;
        }

        let sequence = ctx.next_sequence();
        let event = ReservationEvent::new(
            sequence,
            self.reservation_id.clone(),
            actor,
            ctx.now,
            ReservationEventType::Cancelled,
            EventPayload::Cancelled {
                reason: self.reason.clone(),
                cancelled_by_user_id: actor.user_id,
                superseded_by_id: self.superseded_by_id.clone(),
                deposit_refundable: snapshot.payment_policy.deposit_required,
            },
        );

        Ok(vec![event])
    }
}
