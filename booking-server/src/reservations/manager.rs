//! ReservationsManager - operation processing and event generation
//!
//! This module handles:
//! - Per-resource locking (bounded wait)
//! - Operation validation via actions
//! - Event generation with global sequence numbers
//! - Persistence to redb (transactional)
//! - Snapshot updates via the reducer
//! - Event broadcasting to in-process subscribers
//!
//! # Operation Flow
//!
//! ```text
//! book/cancel/reschedule/...
//!     ├─ 1. Resolve settings + timezone (cached)
//!     ├─ 2. Acquire per-resource lock (bounded, ConflictError on timeout)
//!     ├─ 3. Begin write transaction
//!     ├─ 4. Run action (validation reads inside the transaction)
//!     ├─ 5. Apply events to snapshots via the reducer
//!     ├─ 6. Persist events and snapshots
//!     ├─ 7. Commit transaction
//!     ├─ 8. Broadcast event(s)
//!     └─ 9. Return the updated snapshot
//! ```

use shared::error::ErrorCode;
use shared::reservation::{
    Actor, ReservationEvent, ReservationSnapshot, ReservationSource,
};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::actions::{
    ActionContext, BookAction, CancelAction, ClientGate, CompleteAction, ConfirmAction,
    NoShowAction, StartServiceAction,
};
use super::error::{EngineError, EngineResult};
use super::locks::ResourceLocks;
use super::reducer;
use super::storage::{ReservationStorage, StorageStats};
use crate::db::StorageError;
use crate::settings::SettingsService;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 8192;

/// Fallback duration when neither the request nor the service defines one
const DEFAULT_DURATION_MINUTES: i32 = 60;

/// Booking input accepted by [`ReservationsManager::book`]
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub account_id: i64,
    pub team_member_id: i64,
    pub client_id: Option<i64>,
    pub client_user_id: Option<i64>,
    pub service_id: Option<i64>,
    pub source: ReservationSource,
    pub starts_at: i64,
    pub duration_minutes: Option<i32>,
    /// Staff-side buffer override; None snapshots the resolved settings
    pub buffer_override: Option<i32>,
    pub internal_notes: Option<String>,
    pub client_notes: Option<String>,
}

/// ReservationsManager for operation processing
///
/// The `epoch` field is a unique identifier generated on each startup;
/// clients use it to detect server restarts and refetch state.
pub struct ReservationsManager {
    storage: ReservationStorage,
    settings: SettingsService,
    locks: Arc<ResourceLocks>,
    event_tx: broadcast::Sender<ReservationEvent>,
    epoch: String,
}

impl ReservationsManager {
    pub fn new(storage: ReservationStorage, settings: SettingsService) -> Self {
        Self::with_locks(storage, settings, Arc::new(ResourceLocks::default()))
    }

    pub fn with_locks(
        storage: ReservationStorage,
        settings: SettingsService,
        locks: Arc<ResourceLocks>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "ReservationsManager started with new epoch");
        Self {
            storage,
            settings,
            locks,
            event_tx,
            epoch,
        }
    }

    /// Get the server epoch (unique instance ID)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Subscribe to event broadcasts (notifier/billing collaborators)
    pub fn subscribe(&self) -> broadcast::Receiver<ReservationEvent> {
        self.event_tx.subscribe()
    }

    pub fn storage(&self) -> &ReservationStorage {
        &self.storage
    }

    pub fn settings(&self) -> &SettingsService {
        &self.settings
    }

    // ========== Operations ==========

    /// Book a reservation
    pub async fn book(
        &self,
        request: BookingRequest,
        actor: Actor,
    ) -> EngineResult<ReservationSnapshot> {
        let action = self.build_book_action(&request, None, None, true)?;
        let reservation_id = action.reservation_id.clone();

        self.execute((request.account_id, request.team_member_id), move |ctx| {
            action.execute(ctx, &actor)
        })
        .await?;

        tracing::info!(reservation_id = %reservation_id, account_id = request.account_id, "Reservation booked");
        self.require_snapshot(&reservation_id)
    }

    /// Book a queue entry without calendar validation (walk-in tickets)
    pub(crate) async fn book_unchecked(
        &self,
        request: BookingRequest,
        actor: Actor,
    ) -> EngineResult<ReservationSnapshot> {
        let action = self.build_book_action(&request, None, None, false)?;
        let reservation_id = action.reservation_id.clone();

        self.execute((request.account_id, request.team_member_id), move |ctx| {
            action.execute(ctx, &actor)
        })
        .await?;

        self.require_snapshot(&reservation_id)
    }

    /// Cancel a reservation
    pub async fn cancel(
        &self,
        reservation_id: &str,
        actor: Actor,
        reason: Option<String>,
    ) -> EngineResult<ReservationSnapshot> {
        let snapshot = self.require_snapshot(reservation_id)?;
        let settings = self
            .settings
            .resolve(snapshot.account_id, Some(snapshot.team_member_id))?;

        let action = CancelAction {
            reservation_id: reservation_id.to_string(),
            reason,
            superseded_by_id: None,
            gate: ClientGate {
                allowed: settings.allow_client_cancel,
                denial_code: ErrorCode::ClientCancelDisabled,
                cutoff_hours: settings.cancellation_cutoff_hours,
            },
        };

        self.execute((snapshot.account_id, snapshot.team_member_id), move |ctx| {
            action.execute(ctx, &actor)
        })
        .await?;

        tracing::info!(reservation_id, "Reservation cancelled");
        self.require_snapshot(reservation_id)
    }

    /// Reschedule: atomic cancel of the original plus creation of a
    /// successor carrying `rescheduled_from_id`. A crash between the two
    /// halves is impossible: both run in one storage transaction.
    pub async fn reschedule(
        &self,
        reservation_id: &str,
        new_starts_at: i64,
        new_team_member_id: Option<i64>,
        actor: Actor,
        reason: Option<String>,
    ) -> EngineResult<ReservationSnapshot> {
        let original = self.require_snapshot(reservation_id)?;
        let target_member = new_team_member_id.unwrap_or(original.team_member_id);
        let settings = self
            .settings
            .resolve(original.account_id, Some(original.team_member_id))?;

        let request = BookingRequest {
            account_id: original.account_id,
            team_member_id: target_member,
            client_id: original.client_id,
            client_user_id: original.client_user_id,
            service_id: original.service_id,
            source: original.source,
            starts_at: new_starts_at,
            duration_minutes: Some(original.duration_minutes),
            buffer_override: None,
            internal_notes: original.internal_notes.clone(),
            client_notes: original.client_notes.clone(),
        };
        let book = self.build_book_action(
            &request,
            Some(reservation_id.to_string()),
            Some(reservation_id.to_string()),
            true,
        )?;
        let new_id = book.reservation_id.clone();

        let cancel = CancelAction {
            reservation_id: reservation_id.to_string(),
            reason,
            superseded_by_id: Some(new_id.clone()),
            gate: ClientGate {
                allowed: settings.allow_client_reschedule,
                denial_code: ErrorCode::ClientRescheduleDisabled,
                cutoff_hours: settings.cancellation_cutoff_hours,
            },
        };

        // Lock the involved resources in a stable order; a cross-member
        // reschedule holds both so neither calendar can shift underneath
        let account_id = original.account_id;
        let old_member = original.team_member_id;
        let (first, second) = if old_member <= target_member {
            (old_member, target_member)
        } else {
            (target_member, old_member)
        };
        let _first_guard = self.locks.acquire(account_id, first).await?;
        let _second_guard = if second != first {
            Some(self.locks.acquire(account_id, second).await?)
        } else {
            None
        };

        self.commit_events(|ctx| {
            let mut events = cancel.execute(ctx, &actor)?;
            events.extend(book.execute(ctx, &actor)?);
            Ok(events)
        })?;

        tracing::info!(
            original = reservation_id,
            successor = %new_id,
            "Reservation rescheduled"
        );
        self.require_snapshot(&new_id)
    }

    /// Confirm a requested reservation (staff)
    pub async fn confirm(
        &self,
        reservation_id: &str,
        actor: Actor,
    ) -> EngineResult<ReservationSnapshot> {
        let snapshot = self.require_snapshot(reservation_id)?;
        let action = ConfirmAction {
            reservation_id: reservation_id.to_string(),
        };
        self.execute((snapshot.account_id, snapshot.team_member_id), move |ctx| {
            action.execute(ctx, &actor)
        })
        .await?;
        self.require_snapshot(reservation_id)
    }

    /// Start service (check-in)
    pub async fn start_service(
        &self,
        reservation_id: &str,
        actor: Actor,
    ) -> EngineResult<ReservationSnapshot> {
        let snapshot = self.require_snapshot(reservation_id)?;
        let action = StartServiceAction {
            reservation_id: reservation_id.to_string(),
        };
        self.execute((snapshot.account_id, snapshot.team_member_id), move |ctx| {
            action.execute(ctx, &actor)
        })
        .await?;
        self.require_snapshot(reservation_id)
    }

    /// Complete a reservation (staff)
    pub async fn complete(
        &self,
        reservation_id: &str,
        actor: Actor,
    ) -> EngineResult<ReservationSnapshot> {
        let snapshot = self.require_snapshot(reservation_id)?;
        let action = CompleteAction {
            reservation_id: reservation_id.to_string(),
        };
        self.execute((snapshot.account_id, snapshot.team_member_id), move |ctx| {
            action.execute(ctx, &actor)
        })
        .await?;
        self.require_snapshot(reservation_id)
    }

    /// Mark a no-show (staff; the grace sweeper acts as system)
    pub async fn mark_no_show(
        &self,
        reservation_id: &str,
        actor: Actor,
    ) -> EngineResult<ReservationSnapshot> {
        let snapshot = self.require_snapshot(reservation_id)?;
        let action = NoShowAction {
            reservation_id: reservation_id.to_string(),
        };
        self.execute((snapshot.account_id, snapshot.team_member_id), move |ctx| {
            action.execute(ctx, &actor)
        })
        .await?;
        tracing::info!(reservation_id, "Reservation marked no-show");
        self.require_snapshot(reservation_id)
    }

    // ========== Queries ==========

    pub fn get_snapshot(&self, reservation_id: &str) -> EngineResult<Option<ReservationSnapshot>> {
        Ok(self.storage.get_snapshot(reservation_id)?)
    }

    pub fn require_snapshot(&self, reservation_id: &str) -> EngineResult<ReservationSnapshot> {
        self.storage
            .get_snapshot(reservation_id)?
            .ok_or_else(|| EngineError::ReservationNotFound(reservation_id.to_string()))
    }

    pub fn active_for_resource(
        &self,
        account_id: i64,
        team_member_id: i64,
    ) -> EngineResult<Vec<ReservationSnapshot>> {
        Ok(self.storage.get_active_for_resource(account_id, team_member_id)?)
    }

    pub fn active_for_account(&self, account_id: i64) -> EngineResult<Vec<ReservationSnapshot>> {
        Ok(self.storage.get_active_for_account(account_id)?)
    }

    pub fn events_for_reservation(
        &self,
        reservation_id: &str,
    ) -> EngineResult<Vec<ReservationEvent>> {
        Ok(self.storage.get_events_for_reservation(reservation_id)?)
    }

    pub fn stats(&self) -> EngineResult<StorageStats> {
        Ok(self.storage.get_stats()?)
    }

    // ========== Internals ==========

    fn build_book_action(
        &self,
        request: &BookingRequest,
        rescheduled_from_id: Option<String>,
        ignore_reservation_id: Option<String>,
        validate_slot: bool,
    ) -> EngineResult<BookAction> {
        let settings = self
            .settings
            .resolve(request.account_id, Some(request.team_member_id))?;
        let tz = self.settings.timezone(request.account_id)?;
        let availability = self
            .settings
            .store()
            .get_availability(request.account_id, request.team_member_id)?;

        Ok(BookAction {
            reservation_id: shared::util::new_id(),
            account_id: request.account_id,
            team_member_id: request.team_member_id,
            client_id: request.client_id,
            client_user_id: request.client_user_id,
            service_id: request.service_id,
            source: request.source,
            starts_at: request.starts_at,
            duration_minutes: request
                .duration_minutes
                .unwrap_or(DEFAULT_DURATION_MINUTES),
            buffer_override: request.buffer_override,
            internal_notes: request.internal_notes.clone(),
            client_notes: request.client_notes.clone(),
            rescheduled_from_id,
            ignore_reservation_id,
            validate_slot,
            settings,
            availability,
            tz,
        })
    }

    /// Acquire the lane lock, then run the build-apply-persist pipeline
    pub(crate) async fn execute<F>(
        &self,
        lock_key: (i64, i64),
        build: F,
    ) -> EngineResult<Vec<ReservationEvent>>
    where
        F: FnOnce(&mut ActionContext<'_>) -> EngineResult<Vec<ReservationEvent>>,
    {
        let _guard = self.locks.acquire(lock_key.0, lock_key.1).await?;
        let mut out = Vec::new();
        self.commit_events(|ctx| {
            let events = build(ctx)?;
            out = events.clone();
            Ok(events)
        })?;
        Ok(out)
    }

    /// Run one transactional pipeline: build events, apply via the reducer,
    /// persist events + snapshots, bump the sequence, commit, broadcast.
    /// An error anywhere aborts the transaction with nothing persisted.
    fn commit_events<F>(&self, build: F) -> EngineResult<()>
    where
        F: FnOnce(&mut ActionContext<'_>) -> EngineResult<Vec<ReservationEvent>>,
    {
        let now = shared::util::now_millis();
        let txn = self.storage.begin_write()?;
        let current_sequence = self.storage.get_current_sequence_txn(&txn)?;

        let (events, max_sequence) = {
            let mut ctx = ActionContext::new(&txn, &self.storage, current_sequence, now);
            let events = build(&mut ctx)?;
            let max = ctx.current_sequence();
            (events, max)
        };

        for event in &events {
            let mut snapshot = self
                .storage
                .get_snapshot_txn(&txn, &event.reservation_id)?
                .unwrap_or_else(|| ReservationSnapshot::new(event.reservation_id.clone()));
            reducer::apply(&mut snapshot, event);
            self.storage.store_snapshot(&txn, &snapshot)?;
            self.storage.store_event(&txn, event)?;
        }

        if max_sequence > current_sequence {
            self.storage.set_sequence(&txn, max_sequence)?;
        }

        txn.commit().map_err(StorageError::from)?;

        // Broadcast after successful commit
        for event in events {
            if self.event_tx.send(event).is_err() {
                // No active subscribers; signals are best-effort in-process
                break;
            }
        }

        Ok(())
    }
}
