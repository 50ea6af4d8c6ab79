//! Slot Calculator
//!
//! Generates candidate start times at `slot_interval_minutes` granularity
//! within `[now + min_notice, now + max_advance_days]`, intersected with the
//! resource's working-day intervals, excluding candidates that collide with
//! an active reservation once buffers are applied.
//!
//! Fully booked is not an error: the result is simply empty.

use chrono::Timelike;
use chrono_tz::Tz;
use shared::models::availability::AvailabilityRow;
use shared::models::settings::{MAX_BUFFER_MINUTES, ReservationSettings};
use shared::reservation::ReservationSnapshot;

use super::availability::day_intervals;
use crate::utils::time::{
    date_minute_to_millis, day_end_millis, local_date, millis_to_rfc3339, slot_label, to_local,
};

/// A bookable candidate start time
#[derive(Debug, Clone, serde::Serialize)]
pub struct Slot {
    pub team_member_id: i64,
    /// RFC 3339, UTC
    pub starts_at: String,
    /// RFC 3339, UTC
    pub ends_at: String,
    /// Human label in the business timezone, e.g. "Fri, Jun 12 - 14:30"
    pub label: String,
    /// Business-local date (YYYY-MM-DD)
    pub date: String,
    /// Business-local time (HH:MM)
    pub time: String,
    #[serde(skip)]
    pub starts_at_millis: i64,
    #[serde(skip)]
    pub ends_at_millis: i64,
}

/// Inputs for one resource's slot generation
#[derive(Debug, Clone, Copy)]
pub struct SlotRequest<'a> {
    pub settings: &'a ReservationSettings,
    pub team_member_id: i64,
    /// Existing reservations on the resource (all statuses; non-active are
    /// ignored here)
    pub existing: &'a [ReservationSnapshot],
    pub availability: Option<&'a AvailabilityRow>,
    /// Requested range, UTC millis, slots must fit inside `[start, end]`
    pub range_start: i64,
    pub range_end: i64,
    pub duration_minutes: i32,
    /// Evaluation instant (injected for determinism)
    pub now: i64,
    /// Business timezone
    pub tz: Tz,
}

/// Booking-window violation detail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowViolation {
    /// Start is inside the minimum notice window
    TooSoon { earliest: i64 },
    /// Start is beyond the booking horizon
    TooFar { horizon: i64 },
}

/// Latest bookable instant (inclusive). `max_advance_days == 0` limits
/// booking to the rest of the current business day.
pub fn booking_horizon(now: i64, settings: &ReservationSettings, tz: Tz) -> i64 {
    if settings.max_advance_days == 0 {
        // Last instant of today; next-day midnight is already out
        day_end_millis(local_date(now, tz), tz) - 1
    } else {
        now + i64::from(settings.max_advance_days) * 86_400_000
    }
}

/// Validate a start time against the notice/advance windows
pub fn check_booking_window(
    starts_at: i64,
    now: i64,
    settings: &ReservationSettings,
    tz: Tz,
) -> Result<(), WindowViolation> {
    let earliest = now + i64::from(settings.min_notice_minutes.max(0)) * 60_000;
    if starts_at < earliest {
        return Err(WindowViolation::TooSoon { earliest });
    }

    let horizon = booking_horizon(now, settings, tz);
    if starts_at > horizon {
        return Err(WindowViolation::TooFar { horizon });
    }

    Ok(())
}

/// Does `[slot_start, slot_end)` collide with an active reservation once
/// buffers are applied?
///
/// The blocked window around an existing reservation uses the effective
/// buffer `max(candidate buffer, that reservation's snapshot buffer)`,
/// applied symmetrically on both of its sides. A reservation being
/// rescheduled is excluded via `ignore_reservation_id`.
pub fn conflicts_with_existing(
    slot_start: i64,
    slot_end: i64,
    buffer_minutes: i32,
    existing: &[ReservationSnapshot],
    ignore_reservation_id: Option<&str>,
) -> bool {
    let own_buffer = buffer_minutes.clamp(0, MAX_BUFFER_MINUTES);

    existing
        .iter()
        .filter(|r| r.is_active())
        .filter(|r| Some(r.reservation_id.as_str()) != ignore_reservation_id)
        .any(|r| {
            let effective =
                i64::from(own_buffer.max(r.buffer_minutes.clamp(0, MAX_BUFFER_MINUTES))) * 60_000;
            let busy_start = r.starts_at - effective;
            let busy_end = r.ends_at + effective;
            slot_start < busy_end && slot_end > busy_start
        })
}

/// Round a timestamp up to the next grid boundary (business-local wall
/// clock). Already-aligned timestamps are returned unchanged.
fn align_to_interval(millis: i64, interval_minutes: i32, tz: Tz) -> i64 {
    let interval = interval_minutes.max(1) as u32;
    let local = to_local(millis, tz);
    let date = local.date_naive();
    let minute_of_day = local.hour() * 60 + local.minute();
    let sub_minute = local.second() > 0 || millis.rem_euclid(60_000) > 0;

    let remainder = minute_of_day % interval;
    let aligned = if remainder == 0 && !sub_minute {
        minute_of_day
    } else {
        minute_of_day - remainder + interval
    };

    if aligned >= 1440 {
        day_end_millis(date, tz)
    } else {
        date_minute_to_millis(date, aligned, tz)
    }
}

/// Generate the ordered sequence of bookable start times for one resource.
///
/// Chronological ascending; finite; empty when nothing fits.
pub fn available_slots(req: &SlotRequest<'_>) -> Vec<Slot> {
    if req.range_end <= req.range_start || req.duration_minutes <= 0 {
        return Vec::new();
    }

    let settings = req.settings;
    let interval_minutes = settings.slot_interval_minutes.clamp(5, 120);
    let buffer_minutes = settings.buffer_minutes.clamp(0, MAX_BUFFER_MINUTES);
    let duration_ms = i64::from(req.duration_minutes) * 60_000;
    let horizon = booking_horizon(req.now, settings, req.tz);

    let mut slots = Vec::new();
    let mut date = local_date(req.range_start, req.tz);
    let last_date = local_date(req.range_end, req.tz);

    while date <= last_date {
        // Nothing past the horizon can qualify
        if day_start_of(date, req.tz) > horizon {
            break;
        }

        for interval in day_intervals(req.availability, date, req.tz) {
            let mut cursor = align_to_interval(interval.start, interval_minutes, req.tz);

            while cursor + duration_ms <= interval.end {
                let slot_start = cursor;
                let slot_end = cursor + duration_ms;
                cursor += i64::from(interval_minutes) * 60_000;

                if slot_start < req.range_start || slot_end > req.range_end {
                    continue;
                }
                if check_booking_window(slot_start, req.now, settings, req.tz).is_err() {
                    continue;
                }
                if conflicts_with_existing(slot_start, slot_end, buffer_minutes, req.existing, None)
                {
                    continue;
                }

                let local = to_local(slot_start, req.tz);
                slots.push(Slot {
                    team_member_id: req.team_member_id,
                    starts_at: millis_to_rfc3339(slot_start),
                    ends_at: millis_to_rfc3339(slot_end),
                    label: slot_label(slot_start, req.tz),
                    date: local.date_naive().to_string(),
                    time: local.format("%H:%M").to_string(),
                    starts_at_millis: slot_start,
                    ends_at_millis: slot_end,
                });
            }
        }

        let Some(next) = date.succ_opt() else { break };
        date = next;
    }

    slots.sort_by_key(|s| s.starts_at_millis);
    slots
}

fn day_start_of(date: chrono::NaiveDate, tz: Tz) -> i64 {
    crate::utils::time::day_start_millis(date, tz)
}
