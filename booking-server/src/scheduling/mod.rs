//! Slot Calculation Module
//!
//! Pure scheduling logic, no storage access:
//!
//! - **availability**: working-day interval math (weekly windows, dated
//!   exceptions, merge/subtract normalization)
//! - **slots**: candidate start-time generation with notice/advance windows
//!   and buffered-overlap exclusion
//!
//! All timestamps are UTC Unix millis; the slot grid is anchored to the
//! account's business timezone.

pub mod availability;
pub mod slots;

pub use availability::{Interval, day_intervals};
pub use slots::{Slot, SlotRequest, WindowViolation, available_slots, check_booking_window,
    conflicts_with_existing};
