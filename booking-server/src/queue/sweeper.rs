//! Grace-expiry sweeper
//!
//! Periodic background task. Each pass:
//!
//! 1. **Grace expiry**: called tickets past `grace_expires_at` without a
//!    check-in become `no_show` (appointment tier with
//!    `queue_no_show_on_grace_expiry`) or are re-queued at the tail of their
//!    tier.
//! 2. **Late release**: `requested` reservations whose start passed more
//!    than `late_release_minutes` ago are cancelled, returning the slot to
//!    availability.
//!
//! The sweep is idempotent and safely re-entrant: every mutation re-checks
//! the trigger condition inside its transaction, so overlapping runs act at
//! most once per ticket.

use shared::reservation::{
    Actor, EventPayload, QueueTier, ReservationEvent, ReservationEventType, ReservationSnapshot,
    ReservationStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::reservations::error::{EngineError, EngineResult};
use crate::reservations::manager::ReservationsManager;

/// Lane-lock key shared with the dispatcher
const LANE_LOCK_MEMBER: i64 = 0;

/// What one sweep pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub no_shows: usize,
    pub requeued: usize,
    pub released: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.no_shows == 0 && self.requeued == 0 && self.released == 0
    }
}

/// Periodic grace-expiry and late-release sweeper
pub struct GraceSweeper {
    manager: Arc<ReservationsManager>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl GraceSweeper {
    pub fn new(
        manager: Arc<ReservationsManager>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            manager,
            interval,
            shutdown,
        }
    }

    /// Main loop: tick until shutdown
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Grace sweeper started");
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match self.sweep_once().await {
                        Ok(report) if !report.is_empty() => {
                            tracing::info!(
                                no_shows = report.no_shows,
                                requeued = report.requeued,
                                released = report.released,
                                "Sweep pass finished"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!(error = %e, "Sweep pass failed"),
                    }
                }
            }
        }

        tracing::info!("Grace sweeper stopped");
    }

    /// One pass at the current wall clock
    pub async fn sweep_once(&self) -> EngineResult<SweepReport> {
        self.sweep_once_at(shared::util::now_millis()).await
    }

    /// One pass evaluated at an explicit instant (deterministic in tests)
    pub async fn sweep_once_at(&self, now: i64) -> EngineResult<SweepReport> {
        let mut report = SweepReport::default();
        let active = self.manager.storage().get_all_active()?;

        for snapshot in active {
            let result = self.sweep_reservation(&snapshot, now, &mut report).await;
            if let Err(e) = result {
                // A lost race with staff action is expected; anything else
                // is logged and the sweep moves on
                match e {
                    EngineError::InvalidStateTransition { .. }
                    | EngineError::InvalidQueueAction(_) => {
                        tracing::debug!(
                            reservation_id = %snapshot.reservation_id,
                            error = %e,
                            "Sweep target changed underneath, skipping"
                        );
                    }
                    other => {
                        tracing::error!(
                            reservation_id = %snapshot.reservation_id,
                            error = %other,
                            "Sweep action failed"
                        );
                    }
                }
            }
        }

        Ok(report)
    }

    async fn sweep_reservation(
        &self,
        snapshot: &ReservationSnapshot,
        now: i64,
        report: &mut SweepReport,
    ) -> EngineResult<()> {
        let settings = self.manager.settings().resolve(snapshot.account_id, None)?;

        // ========== Grace expiry ==========
        if let Some(ticket) = snapshot.queue_ticket.as_ref()
            && ticket.is_called()
            && ticket.grace_expires_at.is_some_and(|deadline| deadline < now)
        {
            let escalate = settings.queue_no_show_on_grace_expiry
                && ticket.tier == QueueTier::Appointment
                && matches!(
                    snapshot.status,
                    ReservationStatus::Confirmed | ReservationStatus::InService
                );

            if escalate {
                self.manager
                    .mark_no_show(&snapshot.reservation_id, Actor::system())
                    .await?;
                report.no_shows += 1;
            } else {
                self.requeue(&snapshot.reservation_id, snapshot.account_id, now)
                    .await?;
                report.requeued += 1;
            }
            return Ok(());
        }

        // ========== Late release ==========
        if settings.late_release_minutes > 0
            && snapshot.status == ReservationStatus::Requested
            && snapshot.queue_ticket.is_none()
        {
            let release_at =
                snapshot.starts_at + i64::from(settings.late_release_minutes) * 60_000;
            if now > release_at {
                self.manager
                    .cancel(
                        &snapshot.reservation_id,
                        Actor::system(),
                        Some("released: unconfirmed past start".to_string()),
                    )
                    .await?;
                report.released += 1;
            }
        }

        Ok(())
    }

    /// Send an expired ticket to the tail of its tier. The expiry condition
    /// is re-checked inside the transaction so overlapping sweeps act once.
    async fn requeue(&self, reservation_id: &str, account_id: i64, now: i64) -> EngineResult<()> {
        let id = reservation_id.to_string();
        let actor = Actor::system();

        self.manager
            .execute((account_id, LANE_LOCK_MEMBER), move |ctx| {
                let snapshot = ctx.load_snapshot(&id)?;
                let Some(ticket) = snapshot.queue_ticket.as_ref() else {
                    return Err(EngineError::TicketNotFound(id.clone()));
                };
                if !ticket.is_called()
                    || !ticket.grace_expires_at.is_some_and(|deadline| deadline < now)
                {
                    return Err(EngineError::InvalidQueueAction(format!(
                        "ticket {} no longer grace-expired",
                        ticket.ticket_number
                    )));
                }

                let sequence = ctx.next_sequence();
                Ok(vec![ReservationEvent::new(
                    sequence,
                    id.clone(),
                    &actor,
                    ctx.now,
                    ReservationEventType::TicketRequeued,
                    EventPayload::TicketRequeued { enqueued_at: ctx.now },
                )])
            })
            .await?;

        Ok(())
    }
}
