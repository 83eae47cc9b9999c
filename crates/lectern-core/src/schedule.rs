//! Interval and date projection
//!
//! Pure calendar arithmetic. No I/O, no clock access: every function takes
//! `now` explicitly and returns the same output for the same input.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::config::SchedulingConfig;
use crate::item::Item;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Clamp a rounded interval into the configured bounds, apply the interval
/// modifier and clamp again.
pub fn constrain_interval(raw_days: f64, config: &SchedulingConfig) -> i64 {
    let min = config.min_interval_days();
    let max = config.max_interval_days();

    let rounded = raw_days.round().max(1.0);
    let clamped = rounded.clamp(min as f64, max as f64);
    let modified = (clamped * config.interval_modifier()).round();

    (modified.clamp(min as f64, max as f64)) as i64
}

/// Due date for an interval starting at `now`.
///
/// The interval is held within the configured bounds.
///
/// # Panics
///
/// Panics if the due date falls outside the representable calendar range,
/// which only happens for a `now` at the very end of that range.
pub fn project(interval_days: i64, now: DateTime<Utc>, config: &SchedulingConfig) -> DateTime<Utc> {
    let days = interval_days.clamp(config.min_interval_days(), config.max_interval_days());
    Duration::try_days(days)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or_else(|| {
            panic!(
                "due date {} + {} days is outside the representable range",
                now.to_rfc3339(),
                days
            )
        })
}

/// Whether the item should be presented at `now` (new items always are)
pub fn is_due(item: &Item, now: DateTime<Utc>) -> bool {
    item.next_due_at.is_none_or(|due| due <= now)
}

/// Whole days past the due date; 0 for new or not-yet-due items
pub fn days_overdue(item: &Item, now: DateTime<Utc>) -> i64 {
    match item.next_due_at {
        Some(due) if due < now => (now - due).num_days(),
        _ => 0,
    }
}

/// Fractional days between two instants, never negative
pub fn elapsed_days(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let seconds = (now - since).num_milliseconds() as f64 / 1000.0;
    (seconds / SECONDS_PER_DAY).max(0.0)
}

/// Midnight (UTC) at the start of the day containing `now`
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}
