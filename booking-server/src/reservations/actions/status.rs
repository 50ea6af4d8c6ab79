//! Status transition handlers: confirm, start service, complete, no-show
//!
//! Transitions follow the lifecycle
//! `requested → confirmed → in_service → completed` with side exits to
//! `cancelled`/`no_show`. Terminal states reject every transition with an
//! error naming both states.

use rust_decimal::Decimal;
use shared::reservation::{
    Actor, EventPayload, ReservationEvent, ReservationEventType, ReservationStatus,
};

use super::ActionContext;
use crate::reservations::error::{EngineError, EngineResult};

/// Confirm a requested reservation (staff only)
#[derive(Debug, Clone)]
pub struct ConfirmAction {
    pub reservation_id: String,
}

impl ConfirmAction {
    pub fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        actor: &Actor,
    ) -> EngineResult<Vec<ReservationEvent>> {
        if !actor.bypasses_client_gates() {
            return Err(EngineError::staff_only("confirm"));
        }

        let snapshot = ctx.load_snapshot(&self.reservation_id)?;
        if snapshot.status != ReservationStatus::Requested {
            return Err(EngineError::transition(
                snapshot.status,
                ReservationStatus::Confirmed,
            ));
        }

        let sequence = ctx.next_sequence();
        Ok(vec![ReservationEvent::new(
            sequence,
            self.reservation_id.clone(),
            actor,
            ctx.now,
            ReservationEventType::Confirmed,
            EventPayload::Confirmed {},
        )])
    }
}

/// Start service (check-in). Starting from `requested` implies confirmation;
/// no role gate, clients check themselves in at the kiosk.
#[derive(Debug, Clone)]
pub struct StartServiceAction {
    pub reservation_id: String,
}

impl StartServiceAction {
    pub fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        actor: &Actor,
    ) -> EngineResult<Vec<ReservationEvent>> {
        let snapshot = ctx.load_snapshot(&self.reservation_id)?;
        if !matches!(
            snapshot.status,
            ReservationStatus::Requested | ReservationStatus::Confirmed
        ) {
            return Err(EngineError::transition(
                snapshot.status,
                ReservationStatus::InService,
            ));
        }

        let sequence = ctx.next_sequence();
        Ok(vec![ReservationEvent::new(
            sequence,
            self.reservation_id.clone(),
            actor,
            ctx.now,
            ReservationEventType::ServiceStarted,
            EventPayload::ServiceStarted {},
        )])
    }
}

/// Complete a reservation (staff only). Allowed from `in_service`, or from
/// `confirmed` when no explicit check-in step is used.
#[derive(Debug, Clone)]
pub struct CompleteAction {
    pub reservation_id: String,
}

impl CompleteAction {
    pub fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        actor: &Actor,
    ) -> EngineResult<Vec<ReservationEvent>> {
        if !actor.bypasses_client_gates() {
            return Err(EngineError::staff_only("complete"));
        }

        let snapshot = ctx.load_snapshot(&self.reservation_id)?;
        if !matches!(
            snapshot.status,
            ReservationStatus::Confirmed | ReservationStatus::InService
        ) {
            return Err(EngineError::transition(
                snapshot.status,
                ReservationStatus::Completed,
            ));
        }

        // Deposit settles on the invoice; billing is the caller's collaborator
        let deposit_due: Option<Decimal> = snapshot
            .payment_policy
            .deposit_required
            .then_some(snapshot.payment_policy.deposit_amount);

        let sequence = ctx.next_sequence();
        Ok(vec![ReservationEvent::new(
            sequence,
            self.reservation_id.clone(),
            actor,
            ctx.now,
            ReservationEventType::Completed,
            EventPayload::Completed { deposit_due },
        )])
    }
}

/// Mark a no-show (staff only; the grace sweeper acts as system). Allowed
/// from `confirmed`/`in_service` only.
#[derive(Debug, Clone)]
pub struct NoShowAction {
    pub reservation_id: String,
}

impl NoShowAction {
    pub fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        actor: &Actor,
    ) -> EngineResult<Vec<ReservationEvent>> {
        if !actor.bypasses_client_gates() {
            return Err(EngineError::staff_only("no_show"));
        }

        let snapshot = ctx.load_snapshot(&self.reservation_id)?;
        if !matches!(
            snapshot.status,
            ReservationStatus::Confirmed | ReservationStatus::InService
        ) {
            return Err(EngineError::transition(
                snapshot.status,
                ReservationStatus::NoShow,
            ));
        }

        // Fee charge is signalled to the billing collaborator via the event
        let fee_due: Option<Decimal> = snapshot
            .payment_policy
            .no_show_fee_enabled
            .then_some(snapshot.payment_policy.no_show_fee_amount);

        let sequence = ctx.next_sequence();
        Ok(vec![ReservationEvent::new(
            sequence,
            self.reservation_id.clone(),
            actor,
            ctx.now,
            ReservationEventType::NoShowMarked,
            EventPayload::NoShowMarked { fee_due },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservations::storage::ReservationStorage;
    use shared::reservation::{PaymentPolicy, ReservationSnapshot};

    fn storage_with(status: ReservationStatus) -> ReservationStorage {
        let storage = ReservationStorage::open_in_memory().unwrap();
        let mut snapshot = ReservationSnapshot::new("r-1".to_string());
        snapshot.account_id = 1;
        snapshot.team_member_id = 7;
        snapshot.status = status;
        snapshot.payment_policy = PaymentPolicy {
            deposit_required: true,
            deposit_amount: Decimal::new(2000, 2),
            no_show_fee_enabled: true,
            no_show_fee_amount: Decimal::new(1500, 2),
            captured_at: 0,
        };

        let txn = storage.begin_write().unwrap();
        storage.store_snapshot(&txn, &snapshot).unwrap();
        txn.commit().unwrap();
        storage
    }

    #[test]
    fn test_confirm_from_requested() {
        let storage = storage_with(ReservationStatus::Requested);
        let txn = storage.begin_write().unwrap();
        let mut ctx = ActionContext::new(&txn, &storage, 0, 1_000);

        let action = ConfirmAction {
            reservation_id: "r-1".to_string(),
        };
        let events = action.execute(&mut ctx, &Actor::staff(1, "Ana")).unwrap();
        assert_eq!(events[0].event_type, ReservationEventType::Confirmed);
    }

    #[test]
    fn test_confirm_is_staff_only() {
        let storage = storage_with(ReservationStatus::Requested);
        let txn = storage.begin_write().unwrap();
        let mut ctx = ActionContext::new(&txn, &storage, 0, 1_000);

        let action = ConfirmAction {
            reservation_id: "r-1".to_string(),
        };
        let result = action.execute(&mut ctx, &Actor::client(42, "Bo"));
        assert!(matches!(result, Err(EngineError::Permission { .. })));
    }

    #[test]
    fn test_confirm_twice_fails() {
        let storage = storage_with(ReservationStatus::Confirmed);
        let txn = storage.begin_write().unwrap();
        let mut ctx = ActionContext::new(&txn, &storage, 0, 1_000);

        let action = ConfirmAction {
            reservation_id: "r-1".to_string(),
        };
        let result = action.execute(&mut ctx, &Actor::staff(1, "Ana"));
        assert!(matches!(
            result,
            Err(EngineError::InvalidStateTransition {
                from: ReservationStatus::Confirmed,
                to: ReservationStatus::Confirmed,
            })
        ));
    }

    #[test]
    fn test_start_service_from_requested_and_confirmed() {
        for status in [ReservationStatus::Requested, ReservationStatus::Confirmed] {
            let storage = storage_with(status);
            let txn = storage.begin_write().unwrap();
            let mut ctx = ActionContext::new(&txn, &storage, 0, 1_000);

            let action = StartServiceAction {
                reservation_id: "r-1".to_string(),
            };
            assert!(action.execute(&mut ctx, &Actor::client(42, "Bo")).is_ok());
        }
    }

    #[test]
    fn test_complete_emits_deposit_due() {
        let storage = storage_with(ReservationStatus::InService);
        let txn = storage.begin_write().unwrap();
        let mut ctx = ActionContext::new(&txn, &storage, 0, 1_000);

        let action = CompleteAction {
            reservation_id: "r-1".to_string(),
        };
        let events = action.execute(&mut ctx, &Actor::staff(1, "Ana")).unwrap();
        match &events[0].payload {
            EventPayload::Completed { deposit_due } => {
                assert_eq!(*deposit_due, Some(Decimal::new(2000, 2)));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_complete_from_requested_fails() {
        let storage = storage_with(ReservationStatus::Requested);
        let txn = storage.begin_write().unwrap();
        let mut ctx = ActionContext::new(&txn, &storage, 0, 1_000);

        let action = CompleteAction {
            reservation_id: "r-1".to_string(),
        };
        let result = action.execute(&mut ctx, &Actor::staff(1, "Ana"));
        assert!(matches!(
            result,
            Err(EngineError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_no_show_emits_fee_due() {
        let storage = storage_with(ReservationStatus::Confirmed);
        let txn = storage.begin_write().unwrap();
        let mut ctx = ActionContext::new(&txn, &storage, 0, 1_000);

        let action = NoShowAction {
            reservation_id: "r-1".to_string(),
        };
        let events = action.execute(&mut ctx, &Actor::system()).unwrap();
        match &events[0].payload {
            EventPayload::NoShowMarked { fee_due } => {
                assert_eq!(*fee_due, Some(Decimal::new(1500, 2)));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_no_show_not_allowed_from_requested() {
        let storage = storage_with(ReservationStatus::Requested);
        let txn = storage.begin_write().unwrap();
        let mut ctx = ActionContext::new(&txn, &storage, 0, 1_000);

        let action = NoShowAction {
            reservation_id: "r-1".to_string(),
        };
        let result = action.execute(&mut ctx, &Actor::staff(1, "Ana"));
        assert!(matches!(
            result,
            Err(EngineError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_terminal_states_reject_all_transitions() {
        for status in [
            ReservationStatus::Completed,
            ReservationStatus::Cancelled,
            ReservationStatus::NoShow,
        ] {
            let storage = storage_with(status);
            let txn = storage.begin_write().unwrap();
            let mut ctx = ActionContext::new(&txn, &storage, 0, 1_000);

            let start = StartServiceAction {
                reservation_id: "r-1".to_string(),
            };
            assert!(start.execute(&mut ctx, &Actor::staff(1, "Ana")).is_err());

            let complete = CompleteAction {
                reservation_id: "r-1".to_string(),
            };
            assert!(complete.execute(&mut ctx, &Actor::staff(1, "Ana")).is_err());

            let no_show = NoShowAction {
                reservation_id: "r-1".to_string(),
            };
            assert!(no_show.execute(&mut ctx, &Actor::staff(1, "Ana")).is_err());
        }
    }
}
