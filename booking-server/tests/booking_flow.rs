//! End-to-end engine flow against a real database file:
//! settings → availability → booking → reschedule → queue dispatch → sweep.

use std::time::Duration;

use booking_server::core::{Config, ServerState};
use booking_server::queue::{CallOutcome, GraceSweeper, WalkInRequest};
use booking_server::reservations::{BookingRequest, EngineError};
use booking_server::scheduling::{SlotRequest, available_slots};
use shared::models::availability::WeeklyWindow;
use shared::models::settings::{AccountProfile, SettingsOverride};
use shared::reservation::{Actor, QueueTier, ReservationSource, ReservationStatus};
use tokio_util::sync::CancellationToken;

const ACCOUNT: i64 = 1;
const STYLIST: i64 = 7;

async fn salon_state() -> (ServerState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(dir.path().to_str().unwrap(), 0);
    let state = ServerState::initialize(&config).await.unwrap();

    let mut profile = AccountProfile::new(ACCOUNT);
    profile.company_sector = Some("salon".to_string());
    profile.timezone = "UTC".to_string();
    state.settings().upsert_profile(&profile).unwrap();

    (state, dir)
}

fn staff() -> Actor {
    Actor::staff(1, "Ana")
}

fn booking(starts_at: i64, source: ReservationSource) -> BookingRequest {
    BookingRequest {
        account_id: ACCOUNT,
        team_member_id: STYLIST,
        client_id: Some(42),
        client_user_id: None,
        service_id: Some(3),
        source,
        starts_at,
        duration_minutes: Some(30),
        buffer_override: None,
        internal_notes: None,
        client_notes: None,
    }
}

#[tokio::test]
async fn full_booking_and_queue_flow() {
    let (state, _dir) = salon_state().await;
    let manager = &state.manager;

    // Resolved settings carry the salon preset
    let settings = state.settings().resolve(ACCOUNT, Some(STYLIST)).unwrap();
    assert_eq!(settings.buffer_minutes, 10);
    assert!(settings.queue_mode_enabled);

    // Working hours 09:00-18:00 every day
    let weekly: Vec<WeeklyWindow> = (0..7)
        .map(|day| WeeklyWindow {
            day_of_week: day,
            start_minute: 9 * 60,
            end_minute: 18 * 60,
        })
        .collect();
    state
        .settings()
        .store()
        .upsert_availability(&shared::models::availability::AvailabilityRow {
            account_id: ACCOUNT,
            team_member_id: STYLIST,
            weekly,
            exceptions: vec![],
            updated_at: 0,
        })
        .unwrap();

    // Staff books an appointment three days out at 14:00 UTC
    let now = shared::util::now_millis();
    let day = (now / 86_400_000 + 3) * 86_400_000;
    let at_1400 = day + 14 * 3_600_000;

    let appointment = manager
        .book(booking(at_1400, ReservationSource::Staff), staff())
        .await
        .unwrap();
    assert_eq!(appointment.status, ReservationStatus::Confirmed);

    // The generated slot grid avoids the buffered window around it
    let tz = state.settings().timezone(ACCOUNT).unwrap();
    let availability = state
        .settings()
        .store()
        .get_availability(ACCOUNT, STYLIST)
        .unwrap();
    let existing = manager.active_for_resource(ACCOUNT, STYLIST).unwrap();
    let slots = available_slots(&SlotRequest {
        settings: &settings,
        team_member_id: STYLIST,
        existing: &existing,
        availability: availability.as_ref(),
        range_start: day + 9 * 3_600_000,
        range_end: day + 18 * 3_600_000,
        duration_minutes: 30,
        now,
        tz,
    });
    assert!(!slots.is_empty());
    assert!(slots.iter().all(|s| s.time != "14:00"));
    assert!(slots.iter().all(|s| s.time != "13:45"));
    assert!(slots.iter().any(|s| s.time == "14:45"));

    // A conflicting client request is rejected; the slot next to the buffer
    // is accepted
    let conflict = manager
        .book(
            booking(at_1400 + 25 * 60_000, ReservationSource::Client),
            Actor::client(42, "Bo"),
        )
        .await;
    assert!(matches!(conflict, Err(EngineError::Conflict(_))));

    let nearby = manager
        .book(
            booking(at_1400 + 40 * 60_000, ReservationSource::Client),
            Actor::client(42, "Bo"),
        )
        .await
        .unwrap();
    assert_eq!(nearby.status, ReservationStatus::Requested);

    // Staff confirms, then reschedules it to the morning
    manager
        .confirm(&nearby.reservation_id, staff())
        .await
        .unwrap();
    let moved = manager
        .reschedule(&nearby.reservation_id, day + 10 * 3_600_000, None, staff(), None)
        .await
        .unwrap();
    assert_eq!(
        moved.rescheduled_from_id.as_deref(),
        Some(nearby.reservation_id.as_str())
    );
    let old = manager.require_snapshot(&nearby.reservation_id).unwrap();
    assert_eq!(old.status, ReservationStatus::Cancelled);

    // ===== Queue day: a walk-in arrives, then the appointment checks in =====

    let walk_in = state
        .queue
        .issue_walk_in(
            WalkInRequest {
                account_id: ACCOUNT,
                team_member_id: None,
                client_id: Some(44),
                client_user_id: None,
                service_id: None,
                estimated_duration_minutes: Some(20),
                notes: None,
            },
            Actor::client(44, "Cy"),
        )
        .await
        .unwrap();
    assert_eq!(walk_in.queue_ticket.as_ref().unwrap().tier, QueueTier::WalkIn);

    let enqueued = state
        .queue
        .check_in(&appointment.reservation_id, staff())
        .await
        .unwrap();
    assert_eq!(
        enqueued.queue_ticket.as_ref().unwrap().tier,
        QueueTier::Appointment
    );

    // Appointment priority: called before the earlier walk-in
    let outcome = state
        .queue
        .call_next(ACCOUNT, Some(STYLIST), staff())
        .await
        .unwrap();
    let CallOutcome::Called { reservation: called, .. } = outcome else {
        panic!("expected a called ticket");
    };
    assert_eq!(called.reservation_id, appointment.reservation_id);

    // Client checks in and the service runs to completion
    let in_service = state
        .queue
        .check_in(&appointment.reservation_id, Actor::client(42, "Bo"))
        .await
        .unwrap();
    assert_eq!(in_service.status, ReservationStatus::InService);

    let done = manager
        .complete(&appointment.reservation_id, staff())
        .await
        .unwrap();
    assert_eq!(done.status, ReservationStatus::Completed);

    // The walk-in is next; grace expiry re-queues it instead of no-show
    let outcome = state
        .queue
        .call_next(ACCOUNT, Some(STYLIST), staff())
        .await
        .unwrap();
    let CallOutcome::Called { reservation: called_walk_in, .. } = outcome else {
        panic!("expected a called ticket");
    };
    assert_eq!(called_walk_in.reservation_id, walk_in.reservation_id);

    let deadline = called_walk_in
        .queue_ticket
        .as_ref()
        .unwrap()
        .grace_expires_at
        .unwrap();
    let sweeper = GraceSweeper::new(
        manager.clone(),
        Duration::from_secs(30),
        CancellationToken::new(),
    );
    let report = sweeper.sweep_once_at(deadline + 60_000).await.unwrap();
    assert_eq!(report.requeued, 1);

    // Running the same sweep again changes nothing
    let report = sweeper.sweep_once_at(deadline + 60_000).await.unwrap();
    assert!(report.is_empty());

    let requeued = manager.require_snapshot(&walk_in.reservation_id).unwrap();
    let ticket = requeued.queue_ticket.unwrap();
    assert_eq!(ticket.requeues, 1);
    assert!(ticket.called_at.is_none());

    // Audit trail survives in order
    let events = manager
        .events_for_reservation(&appointment.reservation_id)
        .unwrap();
    let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
    let mut sorted = sequences.clone();
    sorted.sort_unstable();
    assert_eq!(sequences, sorted);
}

#[tokio::test]
async fn settings_override_changes_behavior() {
    let (state, _dir) = salon_state().await;

    // Tighten the booking horizon to 30 days at the account level
    state
        .settings()
        .upsert_override(&SettingsOverride {
            account_id: ACCOUNT,
            team_member_id: None,
            max_advance_days: Some(30),
            ..Default::default()
        })
        .unwrap();

    let now = shared::util::now_millis();
    let result = state
        .manager
        .book(
            booking(now + 31 * 86_400_000, ReservationSource::Client),
            Actor::client(42, "Bo"),
        )
        .await;
    match result {
        Err(e @ EngineError::Validation { .. }) => {
            assert_eq!(e.code(), shared::error::ErrorCode::AdvanceWindowExceeded);
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}
