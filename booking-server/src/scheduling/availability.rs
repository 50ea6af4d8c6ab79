//! Working-day interval math
//!
//! A resource's bookable intervals for one calendar day are built from its
//! recurring weekly windows plus dated exceptions:
//!
//! 1. Base = weekly windows matching the weekday, or the full day when the
//!    resource has no weekly windows (unconfigured resources are open).
//! 2. Open exceptions add intervals.
//! 3. Closed exceptions subtract intervals (whole day when no window given).
//! 4. The result is normalized: sorted, overlaps merged.

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use shared::models::availability::{AvailabilityRow, ExceptionKind};

use crate::utils::time::{date_minute_to_millis, day_end_millis, day_start_millis};

/// Half-open interval `[start, end)` in UTC Unix millis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

impl Interval {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, start: i64, end: i64) -> bool {
        start >= self.start && end <= self.end
    }
}

/// Bookable intervals for a resource on one business-local date
pub fn day_intervals(row: Option<&AvailabilityRow>, date: NaiveDate, tz: Tz) -> Vec<Interval> {
    let full_day = Interval::new(day_start_millis(date, tz), day_end_millis(date, tz));

    let Some(row) = row else {
        return vec![full_day];
    };

    // 0 = Sunday .. 6 = Saturday
    let weekday = date.weekday().num_days_from_sunday() as u8;

    let mut base: Vec<Interval> = row
        .weekly
        .iter()
        .filter(|w| w.is_valid() && w.day_of_week == weekday)
        .map(|w| {
            Interval::new(
                date_minute_to_millis(date, u32::from(w.start_minute), tz),
                date_minute_to_millis(date, u32::from(w.end_minute), tz),
            )
        })
        .filter(|i| !i.is_empty())
        .collect();

    // Unconfigured weekly schedule: default open, so closures still apply
    if row.weekly.is_empty() {
        base.push(full_day);
    }

    let mut closed: Vec<Interval> = Vec::new();
    for exception in row.exceptions.iter().filter(|e| e.date == date) {
        let interval = match (exception.start_minute, exception.end_minute) {
            (Some(start), Some(end)) if start < end => Interval::new(
                date_minute_to_millis(date, u32::from(start), tz),
                date_minute_to_millis(date, u32::from(end), tz),
            ),
            // No (or inverted) window: the exception covers the whole day
            _ => full_day,
        };
        if interval.is_empty() {
            continue;
        }
        match exception.kind {
            ExceptionKind::Open => base.push(interval),
            ExceptionKind::Closed => closed.push(interval),
        }
    }

    let mut intervals = normalize_intervals(base);
    for closure in &closed {
        intervals = subtract_interval(intervals, *closure);
    }

    normalize_intervals(intervals)
}

/// Sort by start and merge overlapping/touching intervals
pub fn normalize_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.retain(|i| !i.is_empty());
    if intervals.is_empty() {
        return intervals;
    }

    intervals.sort_by_key(|i| (i.start, i.end));

    let mut normalized: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match normalized.last_mut() {
            Some(last) if interval.start <= last.end => {
                if interval.end > last.end {
                    last.end = interval.end;
                }
            }
            _ => normalized.push(interval),
        }
    }

    normalized
}

/// Remove `closed` from every interval, splitting where necessary
pub fn subtract_interval(intervals: Vec<Interval>, closed: Interval) -> Vec<Interval> {
    let mut results = Vec::with_capacity(intervals.len() + 1);
    for interval in intervals {
        if closed.end <= interval.start || closed.start >= interval.end {
            results.push(interval);
            continue;
        }

        if closed.start > interval.start {
            results.push(Interval::new(interval.start, closed.start));
        }
        if closed.end < interval.end {
            results.push(Interval::new(closed.end, interval.end));
        }
    }
    results
}
