//! Queue Dispatcher
//!
//! Maintains the live queue for accounts with queue mode enabled. Lanes are
//! per staff member (`per_staff`) or one shared pool (`global_pull`). Under
//! `fifo_with_appointment_priority` the appointment tier always dequeues
//! before walk-ins, FIFO by enqueue time within a tier.
//!
//! Calling next from an empty lane is an explicit [`CallOutcome::Empty`],
//! never an error.

use serde::Serialize;
use shared::models::settings::{QueueAssignmentMode, QueueDispatchMode, ReservationSettings};
use shared::reservation::{
    Actor, ActorRole, EventPayload, QueueTicket, QueueTier, ReservationEvent,
    ReservationEventType, ReservationSnapshot, ReservationSource,
};
use std::sync::Arc;

use crate::reservations::error::{EngineError, EngineResult};
use crate::reservations::manager::{BookingRequest, ReservationsManager};

/// Lane-lock key: queue mutations serialize on team member 0 of the account
const LANE_LOCK_MEMBER: i64 = 0;

/// Walk-in estimated duration clamps (minutes)
const MIN_WALK_IN_DURATION: i32 = 5;
const MAX_WALK_IN_DURATION: i32 = 240;

/// Walk-in ticket creation input
#[derive(Debug, Clone)]
pub struct WalkInRequest {
    pub account_id: i64,
    /// None leaves the ticket unassigned (any staff may pull it)
    pub team_member_id: Option<i64>,
    pub client_id: Option<i64>,
    pub client_user_id: Option<i64>,
    pub service_id: Option<i64>,
    pub estimated_duration_minutes: Option<i32>,
    pub notes: Option<String>,
}

/// Result of a call-next request
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CallOutcome {
    Called {
        reservation: ReservationSnapshot,
        /// The staff member who should serve the ticket (the requested one
        /// for unassigned walk-ins)
        team_member_id: Option<i64>,
    },
    Empty,
}

/// Staff queue board entry
#[derive(Debug, Clone, Serialize)]
pub struct QueueBoardItem {
    pub reservation_id: String,
    pub ticket_number: String,
    pub tier: QueueTier,
    pub status: shared::reservation::ReservationStatus,
    pub team_member_id: i64,
    /// 1-based position among waiting tickets in the lane; None once called
    /// or in service
    pub position: Option<u32>,
    /// Rough wait estimate from queued work ahead in the lane
    pub eta_minutes: i64,
    pub called_at: Option<i64>,
    pub grace_expires_at: Option<i64>,
    pub requeues: u32,
}

/// Staff queue board
#[derive(Debug, Clone, Serialize)]
pub struct QueueBoard {
    pub items: Vec<QueueBoardItem>,
    pub stats: QueueStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub waiting: usize,
    pub called: usize,
    pub in_service: usize,
}

/// Queue dispatch service over the reservations manager
#[derive(Clone)]
pub struct QueueService {
    manager: Arc<ReservationsManager>,
}

impl QueueService {
    pub fn new(manager: Arc<ReservationsManager>) -> Self {
        Self { manager }
    }

    /// Resolve settings and reject accounts without the live queue
    fn queue_settings(&self, account_id: i64) -> EngineResult<ReservationSettings> {
        let settings = self.manager.settings().resolve(account_id, None)?;
        if !settings.business_preset.queue_features_enabled() {
            return Err(EngineError::QueueDisabled(
                "live queue is only available for salon businesses".to_string(),
            ));
        }
        if !settings.queue_mode_enabled {
            return Err(EngineError::QueueDisabled(
                "queue mode is disabled for this account".to_string(),
            ));
        }
        Ok(settings)
    }

    // ========== Ticket Issuance ==========

    /// Issue a walk-in ticket: a queue entry starting now, holding no
    /// calendar promise
    pub async fn issue_walk_in(
        &self,
        request: WalkInRequest,
        actor: Actor,
    ) -> EngineResult<ReservationSnapshot> {
        self.queue_settings(request.account_id)?;
        let tz = self.manager.settings().timezone(request.account_id)?;

        let duration = request
            .estimated_duration_minutes
            .unwrap_or(60)
            .clamp(MIN_WALK_IN_DURATION, MAX_WALK_IN_DURATION);
        let source = match actor.role {
            ActorRole::Staff => ReservationSource::Staff,
            _ => ReservationSource::Client,
        };

        let booking = BookingRequest {
            account_id: request.account_id,
            team_member_id: request.team_member_id.unwrap_or(0),
            client_id: request.client_id,
            client_user_id: request.client_user_id,
            service_id: request.service_id,
            source,
            starts_at: shared::util::now_millis(),
            duration_minutes: Some(duration),
            buffer_override: Some(0),
            internal_notes: request.notes,
            client_notes: None,
        };
        let snapshot = self.manager.book_unchecked(booking, actor.clone()).await?;

        // Pre-generate the ticket number: redb does not allow nested write
        // transactions, so the counter bump happens before the lane txn
        let ticket_number = self.manager.storage().next_ticket_number(tz)?;
        let reservation_id = snapshot.reservation_id.clone();

        self.manager
            .execute((request.account_id, LANE_LOCK_MEMBER), move |ctx| {
                let snapshot = ctx.load_snapshot(&reservation_id)?;
                if snapshot.queue_ticket.is_some() {
                    return Err(EngineError::InvalidQueueAction(format!(
                        "reservation {reservation_id} already holds a ticket"
                    )));
                }
                let sequence = ctx.next_sequence();
                Ok(vec![ReservationEvent::new(
                    sequence,
                    reservation_id.clone(),
                    &actor,
                    ctx.now,
                    ReservationEventType::TicketIssued,
                    EventPayload::TicketIssued {
                        ticket: QueueTicket::new(ticket_number.clone(), QueueTier::WalkIn, ctx.now),
                    },
                )])
            })
            .await?;

        tracing::info!(reservation_id = %snapshot.reservation_id, "Walk-in ticket issued");
        self.manager.require_snapshot(&snapshot.reservation_id)
    }

    /// Enqueue an existing appointment (arrival at the desk/kiosk)
    pub async fn enqueue_appointment(
        &self,
        reservation_id: &str,
        actor: Actor,
    ) -> EngineResult<ReservationSnapshot> {
        let snapshot = self.manager.require_snapshot(reservation_id)?;
        self.queue_settings(snapshot.account_id)?;
        let tz = self.manager.settings().timezone(snapshot.account_id)?;

        // Pre-generated for the same nested-transaction reason as above
        let ticket_number = self.manager.storage().next_ticket_number(tz)?;
        let id = reservation_id.to_string();

        self.manager
            .execute((snapshot.account_id, LANE_LOCK_MEMBER), move |ctx| {
                let snapshot = ctx.load_snapshot(&id)?;
                if !snapshot.status.is_active() {
                    return Err(EngineError::InvalidQueueAction(format!(
                        "reservation {id} is {}",
                        snapshot.status
                    )));
                }
                if snapshot.queue_ticket.is_some() {
                    return Err(EngineError::InvalidQueueAction(format!(
                        "reservation {id} already holds a ticket"
                    )));
                }
                let sequence = ctx.next_sequence();
                Ok(vec![ReservationEvent::new(
                    sequence,
                    id.clone(),
                    &actor,
                    ctx.now,
                    ReservationEventType::TicketIssued,
                    EventPayload::TicketIssued {
                        ticket: QueueTicket::new(
                            ticket_number.clone(),
                            QueueTier::Appointment,
                            ctx.now,
                        ),
                    },
                )])
            })
            .await?;

        self.manager.require_snapshot(reservation_id)
    }

    // ========== Dispatch ==========

    /// Call the next ticket in a lane
    pub async fn call_next(
        &self,
        account_id: i64,
        team_member_id: Option<i64>,
        actor: Actor,
    ) -> EngineResult<CallOutcome> {
        let settings = self.queue_settings(account_id)?;
        let grace_ms = i64::from(settings.queue_grace_minutes) * 60_000;
        let threshold = settings.queue_pre_call_threshold as usize;
        let assignment = settings.queue_assignment_mode;
        let dispatch = settings.queue_dispatch_mode;

        let events = self
            .manager
            .execute((account_id, LANE_LOCK_MEMBER), move |ctx| {
                let active = ctx.active_for_account(account_id)?;
                let mut waiting: Vec<&ReservationSnapshot> = active
                    .iter()
                    .filter(|s| waiting_in_lane(s, assignment, team_member_id))
                    .collect();
                sort_for_dispatch(&mut waiting, dispatch);

                let Some(head) = waiting.first() else {
                    return Ok(Vec::new());
                };

                let mut events = Vec::new();
                let sequence = ctx.next_sequence();
                events.push(ReservationEvent::new(
                    sequence,
                    head.reservation_id.clone(),
                    &actor,
                    ctx.now,
                    ReservationEventType::TicketCalled,
                    EventPayload::TicketCalled {
                        grace_expires_at: ctx.now + grace_ms,
                    },
                ));

                // Pre-call signal for tickets that moved near the front
                for (ahead, snapshot) in waiting.iter().skip(1).enumerate() {
                    if ahead >= threshold {
                        break;
                    }
                    let Some(ticket) = snapshot.queue_ticket.as_ref() else {
                        continue;
                    };
                    if ticket.pre_called_at.is_some() {
                        continue;
                    }
                    let sequence = ctx.next_sequence();
                    events.push(ReservationEvent::new(
                        sequence,
                        snapshot.reservation_id.clone(),
                        &actor,
                        ctx.now,
                        ReservationEventType::TicketPreCalled,
                        EventPayload::TicketPreCalled { ahead: ahead as u32 },
                    ));
                }

                Ok(events)
            })
            .await?;

        let called = events
            .iter()
            .find(|e| e.event_type == ReservationEventType::TicketCalled);
        match called {
            Some(event) => {
                let reservation = self.manager.require_snapshot(&event.reservation_id)?;
                let serving = if reservation.team_member_id > 0 {
                    Some(reservation.team_member_id)
                } else {
                    team_member_id
                };
                tracing::info!(
                    reservation_id = %reservation.reservation_id,
                    team_member_id = ?serving,
                    "Ticket called"
                );
                Ok(CallOutcome::Called {
                    reservation,
                    team_member_id: serving,
                })
            }
            None => Ok(CallOutcome::Empty),
        }
    }

    /// Check in a called ticket: confirms arrival and starts service
    pub async fn check_in(
        &self,
        reservation_id: &str,
        actor: Actor,
    ) -> EngineResult<ReservationSnapshot> {
        let snapshot = self.manager.require_snapshot(reservation_id)?;
        self.queue_settings(snapshot.account_id)?;

        let Some(ticket) = snapshot.queue_ticket.as_ref() else {
            // First contact: arriving for an appointment enqueues it
            return self.enqueue_appointment(reservation_id, actor).await;
        };

        if !ticket.is_called() {
            return Err(EngineError::InvalidQueueAction(format!(
                "ticket {} has not been called",
                ticket.ticket_number
            )));
        }

        let id = reservation_id.to_string();
        self.manager
            .execute((snapshot.account_id, LANE_LOCK_MEMBER), move |ctx| {
                let snapshot = ctx.load_snapshot(&id)?;
                let Some(ticket) = snapshot.queue_ticket.as_ref() else {
                    return Err(EngineError::TicketNotFound(id.clone()));
                };
                if !ticket.is_called() {
                    return Err(EngineError::InvalidQueueAction(format!(
                        "ticket {} has not been called",
                        ticket.ticket_number
                    )));
                }

                let mut events = Vec::new();
                let sequence = ctx.next_sequence();
                events.push(ReservationEvent::new(
                    sequence,
                    id.clone(),
                    &actor,
                    ctx.now,
                    ReservationEventType::TicketCheckedIn,
                    EventPayload::TicketCheckedIn {},
                ));
                // Check-in moves the reservation into service
                if !matches!(
                    snapshot.status,
                    shared::reservation::ReservationStatus::InService
                ) {
                    let sequence = ctx.next_sequence();
                    events.push(ReservationEvent::new(
                        sequence,
                        id.clone(),
                        &actor,
                        ctx.now,
                        ReservationEventType::ServiceStarted,
                        EventPayload::ServiceStarted {},
                    ));
                }
                Ok(events)
            })
            .await?;

        self.manager.require_snapshot(reservation_id)
    }

    // ========== Board ==========

    /// Ordered queue board with waiting/called/in-service stats
    pub fn board(&self, account_id: i64) -> EngineResult<QueueBoard> {
        let settings = self.queue_settings(account_id)?;
        let active = self.manager.storage().get_active_for_account(account_id)?;

        let mut ticketed: Vec<&ReservationSnapshot> = active
            .iter()
            .filter(|s| s.queue_ticket.is_some())
            .collect();
        sort_for_dispatch(&mut ticketed, settings.queue_dispatch_mode);

        let mut items = Vec::with_capacity(ticketed.len());
        let mut position_by_lane: std::collections::HashMap<i64, u32> =
            std::collections::HashMap::new();
        let mut eta_by_lane: std::collections::HashMap<i64, i64> =
            std::collections::HashMap::new();

        let mut waiting = 0;
        let mut called = 0;
        let mut in_service = 0;

        for snapshot in ticketed {
            let ticket = snapshot.queue_ticket.as_ref().expect("filtered above");
            let lane = match settings.queue_assignment_mode {
                QueueAssignmentMode::GlobalPull => 0,
                QueueAssignmentMode::PerStaff => snapshot.team_member_id,
            };

            let is_in_service =
                snapshot.status == shared::reservation::ReservationStatus::InService;
            let is_called = ticket.is_called();

            let (position, eta) = if is_in_service {
                *eta_by_lane.entry(lane).or_insert(0) +=
                    i64::from(snapshot.duration_minutes.max(MIN_WALK_IN_DURATION));
                in_service += 1;
                (None, 0)
            } else if is_called {
                called += 1;
                waiting += 1;
                (None, *eta_by_lane.entry(lane).or_insert(0))
            } else {
                waiting += 1;
                let slot = position_by_lane.entry(lane).or_insert(0);
                *slot += 1;
                let position = *slot;
                let lane_eta = eta_by_lane.entry(lane).or_insert(0);
                let eta = *lane_eta;
                *lane_eta += i64::from(snapshot.duration_minutes.max(MIN_WALK_IN_DURATION));
                (Some(position), eta)
            };

            items.push(QueueBoardItem {
                reservation_id: snapshot.reservation_id.clone(),
                ticket_number: ticket.ticket_number.clone(),
                tier: ticket.tier,
                status: snapshot.status,
                team_member_id: snapshot.team_member_id,
                position,
                eta_minutes: eta,
                called_at: ticket.called_at,
                grace_expires_at: ticket.grace_expires_at,
                requeues: ticket.requeues,
            });
        }

        Ok(QueueBoard {
            items,
            stats: QueueStats {
                waiting,
                called,
                in_service,
            },
        })
    }
}

/// Waiting = holds a ticket that has not been called, in the requested lane
fn waiting_in_lane(
    snapshot: &ReservationSnapshot,
    assignment: QueueAssignmentMode,
    team_member_id: Option<i64>,
) -> bool {
    let Some(ticket) = snapshot.queue_ticket.as_ref() else {
        return false;
    };
    if ticket.called_at.is_some() || ticket.checked_in_at.is_some() {
        return false;
    }
    if snapshot.status == shared::reservation::ReservationStatus::InService {
        return false;
    }

    match assignment {
        QueueAssignmentMode::GlobalPull => true,
        QueueAssignmentMode::PerStaff => match team_member_id {
            // Unassigned walk-ins are pullable by any staff member
            Some(member) => snapshot.team_member_id == member || snapshot.team_member_id == 0,
            None => true,
        },
    }
}

/// Dispatch order: appointment tier before walk-in (when the mode says so),
/// FIFO by enqueue time within a tier, reservation id as the stable tiebreak
fn sort_for_dispatch(entries: &mut [&ReservationSnapshot], mode: QueueDispatchMode) {
    let key = |snapshot: &ReservationSnapshot| -> (u8, i64) {
        match snapshot.queue_ticket.as_ref() {
            Some(ticket) => {
                let rank = match mode {
                    QueueDispatchMode::Fifo => 0,
                    QueueDispatchMode::FifoWithAppointmentPriority => ticket.tier.dispatch_rank(),
                };
                (rank, ticket.enqueued_at)
            }
            None => (u8::MAX, i64::MAX),
        }
    };
    entries.sort_by(|a, b| {
        key(a)
            .cmp(&key(b))
            .then_with(|| a.reservation_id.cmp(&b.reservation_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservations::ReservationStorage;
    use crate::settings::SettingsService;
    use shared::models::settings::AccountProfile;
    use shared::reservation::ReservationStatus;

    fn salon_queue() -> (Arc<ReservationsManager>, QueueService) {
        let settings = SettingsService::open_in_memory();
        let mut profile = AccountProfile::new(1);
        profile.company_sector = Some("salon".to_string());
        settings.upsert_profile(&profile).unwrap();

        let storage = ReservationStorage::open_in_memory().unwrap();
        let manager = Arc::new(ReservationsManager::new(storage, settings));
        let queue = QueueService::new(manager.clone());
        (manager, queue)
    }

    fn walk_in(member: Option<i64>) -> WalkInRequest {
        WalkInRequest {
            account_id: 1,
            team_member_id: member,
            client_id: Some(42),
            client_user_id: None,
            service_id: None,
            estimated_duration_minutes: Some(30),
            notes: None,
        }
    }

    async fn booked_appointment(manager: &ReservationsManager) -> ReservationSnapshot {
        let starts_at = shared::util::now_millis() + 3 * 3_600_000;
        manager
            .book(
                BookingRequest {
                    account_id: 1,
                    team_member_id: 7,
                    client_id: Some(43),
                    client_user_id: None,
                    service_id: None,
                    source: ReservationSource::Staff,
                    starts_at,
                    duration_minutes: Some(30),
                    buffer_override: None,
                    internal_notes: None,
                    client_notes: None,
                },
                Actor::staff(1, "Ana"),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_walk_in_ticket_issued() {
        let (_, queue) = salon_queue();
        let snapshot = queue
            .issue_walk_in(walk_in(None), Actor::client(42, "Bo"))
            .await
            .unwrap();

        let ticket = snapshot.queue_ticket.unwrap();
        assert_eq!(ticket.tier, QueueTier::WalkIn);
        assert!(ticket.ticket_number.starts_with("T-"));
        assert!(ticket.called_at.is_none());
        assert_eq!(snapshot.team_member_id, 0);
        assert_eq!(snapshot.status, ReservationStatus::Requested);
    }

    #[tokio::test]
    async fn test_queue_disabled_for_general_account() {
        let settings = SettingsService::open_in_memory();
        let storage = ReservationStorage::open_in_memory().unwrap();
        let manager = Arc::new(ReservationsManager::new(storage, settings));
        let queue = QueueService::new(manager);

        let result = queue
            .issue_walk_in(walk_in(None), Actor::client(42, "Bo"))
            .await;
        assert!(matches!(result, Err(EngineError::QueueDisabled(_))));
    }

    #[tokio::test]
    async fn test_appointment_priority_over_walk_ins() {
        let (manager, queue) = salon_queue();

        // Two walk-ins arrive first
        let w1 = queue
            .issue_walk_in(walk_in(None), Actor::client(42, "Bo"))
            .await
            .unwrap();
        let _w2 = queue
            .issue_walk_in(walk_in(None), Actor::client(44, "Cy"))
            .await
            .unwrap();

        // The appointment arrives last
        let appointment = booked_appointment(&manager).await;
        let appointment = queue
            .enqueue_appointment(&appointment.reservation_id, Actor::staff(1, "Ana"))
            .await
            .unwrap();

        // ...but is called first
        let outcome = queue
            .call_next(1, Some(7), Actor::staff(1, "Ana"))
            .await
            .unwrap();
        match outcome {
            CallOutcome::Called { reservation, .. } => {
                assert_eq!(reservation.reservation_id, appointment.reservation_id);
            }
            CallOutcome::Empty => panic!("expected a called ticket"),
        }

        // Next call pops the earliest walk-in
        let outcome = queue
            .call_next(1, Some(7), Actor::staff(1, "Ana"))
            .await
            .unwrap();
        match outcome {
            CallOutcome::Called { reservation, .. } => {
                assert_eq!(reservation.reservation_id, w1.reservation_id);
            }
            CallOutcome::Empty => panic!("expected a called ticket"),
        }
    }

    #[tokio::test]
    async fn test_call_next_empty_lane() {
        let (_, queue) = salon_queue();
        let outcome = queue
            .call_next(1, Some(7), Actor::staff(1, "Ana"))
            .await
            .unwrap();
        assert!(matches!(outcome, CallOutcome::Empty));
    }

    #[tokio::test]
    async fn test_call_stamps_grace_deadline() {
        let (_, queue) = salon_queue();
        queue
            .issue_walk_in(walk_in(None), Actor::client(42, "Bo"))
            .await
            .unwrap();

        let outcome = queue
            .call_next(1, None, Actor::staff(1, "Ana"))
            .await
            .unwrap();
        let CallOutcome::Called { reservation, .. } = outcome else {
            panic!("expected a called ticket");
        };
        let ticket = reservation.queue_ticket.unwrap();
        let called_at = ticket.called_at.unwrap();
        // salon grace: 5 minutes
        assert_eq!(ticket.grace_expires_at.unwrap(), called_at + 5 * 60_000);
    }

    #[tokio::test]
    async fn test_check_in_after_call_starts_service() {
        let (_, queue) = salon_queue();
        let snapshot = queue
            .issue_walk_in(walk_in(None), Actor::client(42, "Bo"))
            .await
            .unwrap();

        queue.call_next(1, None, Actor::staff(1, "Ana")).await.unwrap();

        let checked_in = queue
            .check_in(&snapshot.reservation_id, Actor::client(42, "Bo"))
            .await
            .unwrap();
        assert_eq!(checked_in.status, ReservationStatus::InService);
        let ticket = checked_in.queue_ticket.unwrap();
        assert!(ticket.checked_in_at.is_some());
        assert!(ticket.grace_expires_at.is_none());
    }

    #[tokio::test]
    async fn test_check_in_without_call_rejected() {
        let (_, queue) = salon_queue();
        let snapshot = queue
            .issue_walk_in(walk_in(None), Actor::client(42, "Bo"))
            .await
            .unwrap();

        let result = queue
            .check_in(&snapshot.reservation_id, Actor::client(42, "Bo"))
            .await;
        assert!(matches!(result, Err(EngineError::InvalidQueueAction(_))));
    }

    #[tokio::test]
    async fn test_check_in_enqueues_unticketed_appointment() {
        let (manager, queue) = salon_queue();
        let appointment = booked_appointment(&manager).await;

        let enqueued = queue
            .check_in(&appointment.reservation_id, Actor::staff(1, "Ana"))
            .await
            .unwrap();
        let ticket = enqueued.queue_ticket.unwrap();
        assert_eq!(ticket.tier, QueueTier::Appointment);
        assert!(ticket.called_at.is_none());
    }

    #[tokio::test]
    async fn test_fifo_within_tier() {
        let (_, queue) = salon_queue();
        let w1 = queue
            .issue_walk_in(walk_in(None), Actor::client(42, "Bo"))
            .await
            .unwrap();
        let _w2 = queue
            .issue_walk_in(walk_in(None), Actor::client(44, "Cy"))
            .await
            .unwrap();

        let outcome = queue.call_next(1, None, Actor::staff(1, "Ana")).await.unwrap();
        let CallOutcome::Called { reservation, .. } = outcome else {
            panic!("expected a called ticket");
        };
        assert_eq!(reservation.reservation_id, w1.reservation_id);
    }

    #[tokio::test]
    async fn test_per_staff_lane_filtering() {
        let (_, queue) = salon_queue();
        let assigned_to_8 = queue
            .issue_walk_in(walk_in(Some(8)), Actor::client(42, "Bo"))
            .await
            .unwrap();
        let unassigned = queue
            .issue_walk_in(walk_in(None), Actor::client(44, "Cy"))
            .await
            .unwrap();

        // Member 7 cannot pull member 8's ticket, but can pull the
        // unassigned one
        let outcome = queue
            .call_next(1, Some(7), Actor::staff(1, "Ana"))
            .await
            .unwrap();
        let CallOutcome::Called { reservation, team_member_id } = outcome else {
            panic!("expected a called ticket");
        };
        assert_eq!(reservation.reservation_id, unassigned.reservation_id);
        assert_eq!(team_member_id, Some(7));

        // Member 8 still gets their own
        let outcome = queue
            .call_next(1, Some(8), Actor::staff(1, "Ana"))
            .await
            .unwrap();
        let CallOutcome::Called { reservation, .. } = outcome else {
            panic!("expected a called ticket");
        };
        assert_eq!(reservation.reservation_id, assigned_to_8.reservation_id);
    }

    #[tokio::test]
    async fn test_pre_call_signal_fires_once() {
        let (manager, queue) = salon_queue();
        let _w1 = queue
            .issue_walk_in(walk_in(None), Actor::client(42, "Bo"))
            .await
            .unwrap();
        let w2 = queue
            .issue_walk_in(walk_in(None), Actor::client(44, "Cy"))
            .await
            .unwrap();

        let mut feed = manager.subscribe();
        queue.call_next(1, None, Actor::staff(1, "Ana")).await.unwrap();

        // w2 is now near the front and gets pre-called
        let after = manager.require_snapshot(&w2.reservation_id).unwrap();
        assert!(after.queue_ticket.unwrap().pre_called_at.is_some());

        let mut saw_pre_call = false;
        while let Ok(event) = feed.try_recv() {
            if event.event_type == ReservationEventType::TicketPreCalled {
                assert_eq!(event.reservation_id, w2.reservation_id);
                saw_pre_call = true;
            }
        }
        assert!(saw_pre_call);
    }

    #[tokio::test]
    async fn test_board_orders_and_counts() {
        let (manager, queue) = salon_queue();
        let _w1 = queue
            .issue_walk_in(walk_in(None), Actor::client(42, "Bo"))
            .await
            .unwrap();
        let appointment = booked_appointment(&manager).await;
        queue
            .enqueue_appointment(&appointment.reservation_id, Actor::staff(1, "Ana"))
            .await
            .unwrap();

        let board = queue.board(1).unwrap();
        assert_eq!(board.items.len(), 2);
        // Appointment tier sorts first despite arriving later
        assert_eq!(board.items[0].tier, QueueTier::Appointment);
        assert_eq!(board.stats.waiting, 2);
        assert_eq!(board.stats.in_service, 0);
    }
}
