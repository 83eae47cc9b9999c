//! Queue analytics
//!
//! Read-only summaries over item snapshots and the rating log: queue
//! counts, a per-day due forecast, leech detection and per-item review
//! metrics.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::fsrs::Grade;
use crate::item::{Item, ItemId, RatingEvent};
use crate::schedule::{days_overdue, is_due, start_of_day};

/// Default number of lapses that marks an item as a leech
pub const DEFAULT_LEECH_THRESHOLD: u32 = 8;

/// Ratings looked at when classifying the difficulty trend
const TREND_WINDOW: usize = 3;

/// Ratings looked at when counting recent failures
const RECENT_WINDOW: usize = 5;

// ============================================================================
// QUEUE STATS
// ============================================================================

/// Counts describing the review queue at one instant
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub total: usize,
    /// Never reviewed
    pub new_items: usize,
    /// Scheduled and due at `now`
    pub due_now: usize,
    /// Scheduled and due before the end of the current UTC day
    pub due_today: usize,
    /// Scheduled and due within the next 7 days
    pub due_this_week: usize,
    /// At least one whole day past due
    pub overdue: usize,
    /// Mean priority (0 for an empty set)
    pub average_priority: f64,
}

/// Summarize a set of items at `now`
pub fn queue_stats(items: &[Item], now: DateTime<Utc>) -> QueueStats {
    let end_of_today = start_of_day(now) + Duration::days(1);
    let end_of_week = now + Duration::days(7);

    let mut stats = QueueStats {
        total: items.len(),
        ..Default::default()
    };
    let mut priority_sum = 0u64;

    for item in items {
        priority_sum += u64::from(item.priority);

        let Some(due) = item.next_due_at else {
            stats.new_items += 1;
            continue;
        };
        if is_due(item, now) {
            stats.due_now += 1;
        }
        if due < end_of_today {
            stats.due_today += 1;
        }
        if due <= end_of_week {
            stats.due_this_week += 1;
        }
        if days_overdue(item, now) >= 1 {
            stats.overdue += 1;
        }
    }

    if !items.is_empty() {
        stats.average_priority = priority_sum as f64 / items.len() as f64;
    }
    stats
}

// ============================================================================
// DUE FORECAST
// ============================================================================

/// Items due on one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueDay {
    pub date: NaiveDate,
    /// Ordered by priority (highest first), then id
    pub item_ids: Vec<ItemId>,
}

/// Upcoming workload grouped by day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueForecast {
    /// One bucket per day starting today (empty days included)
    pub days: Vec<DueDay>,
    /// Due before today
    pub overdue: Vec<ItemId>,
    /// Never scheduled
    pub new: Vec<ItemId>,
}

impl DueForecast {
    /// Total scheduled items across all day buckets
    pub fn scheduled_count(&self) -> usize {
        self.days.iter().map(|day| day.item_ids.len()).sum()
    }
}

fn ordered_ids(mut items: Vec<&Item>) -> Vec<ItemId> {
    items.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
    items.into_iter().map(|item| item.id).collect()
}

/// Group items by due day for the next `days` days.
///
/// Items due after the horizon are left out.
pub fn due_forecast(items: &[Item], now: DateTime<Utc>, days: u32) -> DueForecast {
    let today = start_of_day(now);
    let mut buckets: Vec<Vec<&Item>> = vec![Vec::new(); days as usize];
    let mut overdue = Vec::new();
    let mut new = Vec::new();

    for item in items {
        match item.next_due_at {
            None => new.push(item),
            Some(due) if due < today => overdue.push(item),
            Some(due) => {
                let offset = (start_of_day(due) - today).num_days();
                if let Some(bucket) = usize::try_from(offset)
                    .ok()
                    .and_then(|index| buckets.get_mut(index))
                {
                    bucket.push(item);
                }
            }
        }
    }

    let today_date = today.date_naive();
    let days = buckets
        .into_iter()
        .enumerate()
        .map(|(offset, bucket)| DueDay {
            date: today_date + Duration::days(offset as i64),
            item_ids: ordered_ids(bucket),
        })
        .collect();

    DueForecast {
        days,
        overdue: ordered_ids(overdue),
        new: ordered_ids(new),
    }
}

// ============================================================================
// LEECHES
// ============================================================================

/// AGAIN count per item in a rating log
pub fn lapse_counts(events: &[RatingEvent]) -> BTreeMap<ItemId, u32> {
    let mut counts = BTreeMap::new();
    for event in events.iter().filter(|event| event.grade == Grade::Again) {
        *counts.entry(event.item_id).or_insert(0) += 1;
    }
    counts
}

/// Items with at least `threshold` lapses, most lapses first (then id).
///
/// A threshold of zero is treated as one: items that never lapsed are not
/// leeches.
pub fn detect_leeches(events: &[RatingEvent], threshold: u32) -> Vec<ItemId> {
    let threshold = threshold.max(1);
    let mut leeches: Vec<(ItemId, u32)> = lapse_counts(events)
        .into_iter()
        .filter(|(_, count)| *count >= threshold)
        .collect();
    leeches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    leeches.into_iter().map(|(id, _)| id).collect()
}

// ============================================================================
// ITEM METRICS
// ============================================================================

/// Direction of an item's most recent raw ratings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTrend {
    /// Fewer ratings than the trend window
    New,
    /// Every recent raw rating was 4 or 5
    Easy,
    /// Every recent raw rating was 1 or 2
    Difficult,
    Mixed,
}

impl DifficultyTrend {
    /// String representation
    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyTrend::New => "new",
            DifficultyTrend::Easy => "easy",
            DifficultyTrend::Difficult => "difficult",
            DifficultyTrend::Mixed => "mixed",
        }
    }
}

/// Review performance of one item, derived from its rating log
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetrics {
    pub total_reviews: usize,
    /// Share of GOOD or EASY ratings (0 without ratings)
    pub success_rate: f64,
    /// Mean days between consecutive ratings (0 with fewer than two)
    pub average_gap_days: f64,
    /// Success share among ratings that followed a scheduled interval
    pub retention_rate: f64,
    /// AGAIN or HARD ratings among the last five
    pub recent_failures: usize,
    pub trend: DifficultyTrend,
}

fn recalled(event: &RatingEvent) -> bool {
    event.grade >= Grade::Good
}

fn share(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Summarize the rating log of a single item.
///
/// Events are ordered by timestamp before anything is computed, so the log
/// may be passed in any order.
pub fn item_metrics(events: &[RatingEvent]) -> ItemMetrics {
    let mut ordered: Vec<&RatingEvent> = events.iter().collect();
    ordered.sort_by_key(|event| event.timestamp);

    let total_reviews = ordered.len();
    let successes = ordered.iter().filter(|e| recalled(e)).count();

    let gaps: Vec<f64> = ordered
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_seconds() as f64 / 86_400.0)
        .collect();
    let average_gap_days = if gaps.is_empty() {
        0.0
    } else {
        gaps.iter().sum::<f64>() / gaps.len() as f64
    };

    // the first rating has no interval behind it
    let scheduled = ordered.get(1..).unwrap_or_default();
    let retained = scheduled.iter().filter(|e| recalled(e)).count();

    let recent_failures = ordered
        .iter()
        .rev()
        .take(RECENT_WINDOW)
        .filter(|e| !recalled(e))
        .count();

    let trend = if total_reviews < TREND_WINDOW {
        DifficultyTrend::New
    } else {
        let recent = &ordered[total_reviews - TREND_WINDOW..];
        if recent.iter().all(|e| e.raw_rating >= 4) {
            DifficultyTrend::Easy
        } else if recent.iter().all(|e| e.raw_rating <= 2) {
            DifficultyTrend::Difficult
        } else {
            DifficultyTrend::Mixed
        }
    };

    ItemMetrics {
        total_reviews,
        success_rate: share(successes, total_reviews),
        average_gap_days,
        retention_rate: share(retained, scheduled.len()),
        recent_failures,
        trend,
    }
}

// ============================================================================
// TESTS
// ============================================================================
