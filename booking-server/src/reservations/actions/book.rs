//! Book command handler
//!
//! Creates a reservation: validates the booking window, the resource's
//! working hours and slot availability, snapshots buffer/duration/payment
//! policy, and emits the Booked event.

use chrono_tz::Tz;
use shared::error::ErrorCode;
use shared::models::availability::AvailabilityRow;
use shared::models::settings::{MAX_BUFFER_MINUTES, ReservationSettings};
use shared::reservation::{
    Actor, EventPayload, PaymentPolicy, ReservationEvent, ReservationEventType, ReservationSource,
};

use super::ActionContext;
use crate::reservations::error::{EngineError, EngineResult};
use crate::scheduling::{check_booking_window, conflicts_with_existing, day_intervals};
use crate::utils::time::local_date;

/// Book action
#[derive(Debug, Clone)]
pub struct BookAction {
    /// Pre-generated reservation id
    pub reservation_id: String,
    pub account_id: i64,
    pub team_member_id: i64,
    pub client_id: Option<i64>,
    pub client_user_id: Option<i64>,
    pub service_id: Option<i64>,
    pub source: ReservationSource,
    pub starts_at: i64,
    pub duration_minutes: i32,
    /// Staff may override the buffer at booking time; None snapshots the
    /// resolved settings value
    pub buffer_override: Option<i32>,
    pub internal_notes: Option<String>,
    pub client_notes: Option<String>,
    /// Back-reference when this booking supersedes a cancelled one
    pub rescheduled_from_id: Option<String>,
    /// Excluded from the conflict check (the reservation being rescheduled)
    pub ignore_reservation_id: Option<String>,
    /// Queue walk-ins are queue entries, not calendar promises: they skip
    /// window/availability/conflict validation
    pub validate_slot: bool,
    /// Resolved settings for (account, team member)
    pub settings: ReservationSettings,
    pub availability: Option<AvailabilityRow>,
    pub tz: Tz,
}

impl BookAction {
    pub fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        actor: &Actor,
    ) -> EngineResult<Vec<ReservationEvent>> {
        if self.duration_minutes <= 0 {
            return Err(EngineError::validation_with_code(
                ErrorCode::InvalidTimeRange,
                "Duration must be positive",
            ));
        }

        let starts_at = self.starts_at;
        let ends_at = starts_at + i64::from(self.duration_minutes) * 60_000;
        let buffer_minutes = self
            .buffer_override
            .unwrap_or(self.settings.buffer_minutes)
            .clamp(0, MAX_BUFFER_MINUTES);

        if self.validate_slot {
            if local_date(starts_at, self.tz) != local_date(ends_at, self.tz) {
                return Err(EngineError::validation_with_code(
                    ErrorCode::SpansMultipleDays,
                    "Reservations cannot span multiple days",
                ));
            }

            check_booking_window(starts_at, ctx.now, &self.settings, self.tz)?;

            let date = local_date(starts_at, self.tz);
            let fits = day_intervals(self.availability.as_ref(), date, self.tz)
                .iter()
                .any(|interval| interval.contains(starts_at, ends_at));
            if !fits {
                return Err(EngineError::validation_with_code(
                    ErrorCode::OutsideAvailability,
                    "Selected slot is outside configured availability",
                ));
            }

            let existing = ctx.active_for_resource(self.account_id, self.team_member_id)?;
            if conflicts_with_existing(
                starts_at,
                ends_at,
                buffer_minutes,
                &existing,
                self.ignore_reservation_id.as_deref(),
            ) {
                return Err(EngineError::conflict(format!(
                    "resource {} already booked around {}",
                    self.team_member_id,
                    crate::utils::time::millis_to_rfc3339(starts_at)
                )));
            }
        }

        let sequence = ctx.next_sequence();
        let event = ReservationEvent::new(
            sequence,
            self.reservation_id.clone(),
            actor,
            ctx.now,
            ReservationEventType::Booked,
            EventPayload::Booked {
                account_id: self.account_id,
                team_member_id: self.team_member_id,
                client_id: self.client_id,
                client_user_id: self.client_user_id,
                service_id: self.service_id,
                source: self.source,
                timezone: self.tz.name().to_string(),
                starts_at,
                ends_at,
                duration_minutes: self.duration_minutes,
                buffer_minutes,
                initial_status: self.source.initial_status(),
                payment_policy: PaymentPolicy::from_settings(&self.settings, ctx.now),
                rescheduled_from_id: self.rescheduled_from_id.clone(),
                internal_notes: self.internal_notes.clone(),
                client_notes: self.client_notes.clone(),
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservations::reducer;
    use crate::reservations::storage::ReservationStorage;
    use crate::settings::presets;
    use crate::utils::time::parse_rfc3339_millis;
    use shared::models::settings::BusinessPreset;
    use shared::reservation::{ReservationSnapshot, ReservationStatus};

    const TZ: Tz = chrono_tz::UTC;

    fn ts(value: &str) -> i64 {
        parse_rfc3339_millis(value).unwrap()
    }

    fn action(starts_at: i64, source: ReservationSource) -> BookAction {
        BookAction {
            reservation_id: "r-new".to_string(),
            account_id: 1,
            team_member_id: 7,
            client_id: Some(42),
            client_user_id: None,
            service_id: None,
            source,
            starts_at,
            duration_minutes: 30,
            buffer_override: None,
            internal_notes: None,
            client_notes: None,
            rescheduled_from_id: None,
            ignore_reservation_id: None,
            validate_slot: true,
            settings: presets::defaults(BusinessPreset::Salon),
            availability: None,
            tz: TZ,
        }
    }

    fn store_existing(
        storage: &ReservationStorage,
        id: &str,
        starts_at: i64,
        duration_minutes: i32,
        buffer_minutes: i32,
    ) {
        let mut snapshot = ReservationSnapshot::new(id.to_string());
        snapshot.account_id = 1;
        snapshot.team_member_id = 7;
        snapshot.status = ReservationStatus::Confirmed;
        snapshot.starts_at = starts_at;
        snapshot.ends_at = starts_at + i64::from(duration_minutes) * 60_000;
        snapshot.duration_minutes = duration_minutes;
        snapshot.buffer_minutes = buffer_minutes;

        let txn = storage.begin_write().unwrap();
        storage.store_snapshot(&txn, &snapshot).unwrap();
        txn.commit().unwrap();
    }

    #[test]
    fn test_book_success_snapshots_policy_and_buffer() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let now = ts("2026-06-12T08:00:00Z");
        let mut ctx = ActionContext::new(&txn, &storage, 0, now);

        let action = action(ts("2026-06-12T14:00:00Z"), ReservationSource::Client);
        let events = action.execute(&mut ctx, &Actor::client(42, "Bo")).unwrap();

        assert_eq!(events.len(), 1);
        let mut snapshot = ReservationSnapshot::new("r-new".to_string());
        reducer::apply(&mut snapshot, &events[0]);
        assert_eq!(snapshot.status, ReservationStatus::Requested);
        assert_eq!(snapshot.buffer_minutes, 10);
        assert!(snapshot.payment_policy.deposit_required);
        assert_eq!(snapshot.ends_at - snapshot.starts_at, 30 * 60_000);
    }

    #[test]
    fn test_staff_booking_is_confirmed_directly() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = ActionContext::new(&txn, &storage, 0, ts("2026-06-12T08:00:00Z"));

        let action = action(ts("2026-06-12T14:00:00Z"), ReservationSource::Staff);
        let events = action.execute(&mut ctx, &Actor::staff(1, "Ana")).unwrap();

        let mut snapshot = ReservationSnapshot::new("r-new".to_string());
        reducer::apply(&mut snapshot, &events[0]);
        assert_eq!(snapshot.status, ReservationStatus::Confirmed);
    }

    #[test]
    fn test_book_outside_advance_window_fails() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let now = ts("2026-06-12T08:00:00Z");
        let mut ctx = ActionContext::new(&txn, &storage, 0, now);

        // salon preset allows 60 days; 61 days out must fail
        let action = action(now + 61 * 86_400_000, ReservationSource::Client);
        let result = action.execute(&mut ctx, &Actor::client(42, "Bo"));
        assert!(matches!(
            result,
            Err(EngineError::Validation {
                code: ErrorCode::AdvanceWindowExceeded,
                ..
            })
        ));
    }

    #[test]
    fn test_book_within_notice_window_fails() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let now = ts("2026-06-12T08:00:00Z");
        let mut ctx = ActionContext::new(&txn, &storage, 0, now);

        // salon preset needs 60 minutes notice
        let action = action(now + 30 * 60_000, ReservationSource::Client);
        let result = action.execute(&mut ctx, &Actor::client(42, "Bo"));
        assert!(matches!(
            result,
            Err(EngineError::Validation {
                code: ErrorCode::NoticeWindowViolated,
                ..
            })
        ));
    }

    #[test]
    fn test_book_conflicting_slot_fails() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        store_existing(&storage, "r-1", ts("2026-06-12T14:00:00Z"), 30, 10);

        let txn = storage.begin_write().unwrap();
        let mut ctx = ActionContext::new(&txn, &storage, 0, ts("2026-06-12T08:00:00Z"));

        // 14:25 falls inside the buffered window 13:50-14:40
        let action = action(ts("2026-06-12T14:25:00Z"), ReservationSource::Client);
        let result = action.execute(&mut ctx, &Actor::client(42, "Bo"));
        assert!(matches!(result, Err(EngineError::Conflict(_))));
    }

    #[test]
    fn test_book_adjacent_to_buffer_succeeds() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        store_existing(&storage, "r-1", ts("2026-06-12T14:00:00Z"), 30, 10);

        let txn = storage.begin_write().unwrap();
        let mut ctx = ActionContext::new(&txn, &storage, 0, ts("2026-06-12T08:00:00Z"));

        // 14:40 starts exactly where the buffered window ends
        let action = action(ts("2026-06-12T14:40:00Z"), ReservationSource::Client);
        assert!(action.execute(&mut ctx, &Actor::client(42, "Bo")).is_ok());
    }

    #[test]
    fn test_multi_day_reservation_rejected() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = ActionContext::new(&txn, &storage, 0, ts("2026-06-12T08:00:00Z"));

        let mut action = action(ts("2026-06-12T23:45:00Z"), ReservationSource::Staff);
        action.duration_minutes = 60;
        let result = action.execute(&mut ctx, &Actor::staff(1, "Ana"));
        assert!(matches!(
            result,
            Err(EngineError::Validation {
                code: ErrorCode::SpansMultipleDays,
                ..
            })
        ));
    }

    #[test]
    fn test_walk_in_skips_slot_validation() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        store_existing(&storage, "r-1", ts("2026-06-12T14:00:00Z"), 30, 10);

        let txn = storage.begin_write().unwrap();
        let now = ts("2026-06-12T14:05:00Z");
        let mut ctx = ActionContext::new(&txn, &storage, 0, now);

        // Starts immediately, overlapping the existing booking: allowed as a
        // queue entry
        let mut walk_in = action(now, ReservationSource::Client);
        walk_in.validate_slot = false;
        assert!(walk_in.execute(&mut ctx, &Actor::client(42, "Bo")).is_ok());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = ActionContext::new(&txn, &storage, 0, ts("2026-06-12T08:00:00Z"));

        let mut bad = action(ts("2026-06-12T14:00:00Z"), ReservationSource::Staff);
        bad.duration_minutes = 0;
        let result = bad.execute(&mut ctx, &Actor::staff(1, "Ana"));
        assert!(matches!(
            result,
            Err(EngineError::Validation {
                code: ErrorCode::InvalidTimeRange,
                ..
            })
        ));
    }
}
