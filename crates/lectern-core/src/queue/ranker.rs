//! Queue ranking
//!
//! One scoring formula for every queue the host shows:
//!
//! ```text
//! base  = priority + overdue_bonus_max * (1 - e^(-days_overdue / overdue_scale_days))
//! base  = max(priority, new_item_floor)                  (items never scheduled)
//! final = base + uniform[-1, 1) * randomness_factor * jitter_scale
//! ```
//!
//! Ties on `final` fall back to the earliest `next_due_at` (new items first),
//! then to the lowest item id.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::random::RandomSource;
use crate::item::{Item, ItemId, MAX_PRIORITY};
use crate::schedule::days_overdue;

/// Default base score for items that have never been scheduled
pub const DEFAULT_NEW_ITEM_FLOOR: f64 = 60.0;
/// Default ceiling of the overdue bonus
pub const DEFAULT_OVERDUE_BONUS_MAX: f64 = 30.0;
/// Default overdue saturation scale (days)
pub const DEFAULT_OVERDUE_SCALE_DAYS: f64 = 7.0;
/// Default jitter amplitude at randomness factor 1
pub const DEFAULT_JITTER_SCALE: f64 = 25.0;

// ============================================================================
// PARAMETERS
// ============================================================================

/// Queue ranking constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct RankingParameters {
    /// Minimum base score of a new item
    pub new_item_floor: f64,
    /// Largest bonus an overdue item can earn
    pub overdue_bonus_max: f64,
    /// Days overdue at which ~63% of the bonus is reached
    pub overdue_scale_days: f64,
    /// Jitter amplitude when the randomness factor is 1
    pub jitter_scale: f64,
}

impl Default for RankingParameters {
    fn default() -> Self {
        Self {
            new_item_floor: DEFAULT_NEW_ITEM_FLOOR,
            overdue_bonus_max: DEFAULT_OVERDUE_BONUS_MAX,
            overdue_scale_days: DEFAULT_OVERDUE_SCALE_DAYS,
            jitter_scale: DEFAULT_JITTER_SCALE,
        }
    }
}

impl RankingParameters {
    pub(crate) fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if !(self.new_item_floor.is_finite() && self.new_item_floor >= 0.0) {
            violations.push(format!(
                "ranking.newItemFloor must be a non-negative number (got {})",
                self.new_item_floor
            ));
        }
        if !(self.overdue_bonus_max.is_finite() && self.overdue_bonus_max >= 0.0) {
            violations.push(format!(
                "ranking.overdueBonusMax must be a non-negative number (got {})",
                self.overdue_bonus_max
            ));
        }
        if !(self.overdue_scale_days.is_finite() && self.overdue_scale_days > 0.0) {
            violations.push(format!(
                "ranking.overdueScaleDays must be positive (got {})",
                self.overdue_scale_days
            ));
        }
        if !(self.jitter_scale.is_finite() && self.jitter_scale > 0.0) {
            violations.push(format!(
                "ranking.jitterScale must be positive (got {})",
                self.jitter_scale
            ));
        }
        violations
    }
}

// ============================================================================
// SCORING
// ============================================================================

/// Score breakdown of one ranked item
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedItem {
    /// Ranked item
    pub item_id: ItemId,
    /// Priority plus overdue bonus (or the new-item floor)
    pub base_score: f64,
    /// Random offset; zero when the randomness factor is zero
    pub jitter: f64,
    /// `base_score + jitter`, the sort key
    pub final_score: f64,
    #[serde(skip)]
    next_due_at: Option<DateTime<Utc>>,
}

/// Deterministic part of an item's score
pub fn base_score(item: &Item, now: DateTime<Utc>, params: &RankingParameters) -> f64 {
    let priority = f64::from(item.priority.min(MAX_PRIORITY));

    if item.next_due_at.is_none() {
        return priority.max(params.new_item_floor);
    }

    let overdue = days_overdue(item, now) as f64;
    let bonus = params.overdue_bonus_max * (1.0 - (-overdue / params.overdue_scale_days).exp());
    priority + bonus
}

fn effective_randomness(randomness_factor: f64) -> f64 {
    if randomness_factor.is_nan() {
        0.0
    } else {
        randomness_factor.clamp(0.0, 1.0)
    }
}

fn compare(a: &RankedItem, b: &RankedItem) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| a.next_due_at.cmp(&b.next_due_at))
        .then_with(|| a.item_id.cmp(&b.item_id))
}

/// Score and order a candidate set, keeping the score breakdown.
///
/// The random source is consulted once per item, and only when the
/// randomness factor is positive.
pub fn score_queue<R: RandomSource>(
    items: &[Item],
    randomness_factor: f64,
    now: DateTime<Utc>,
    params: &RankingParameters,
    random: &mut R,
) -> Vec<RankedItem> {
    let factor = effective_randomness(randomness_factor);

    let mut ranked: Vec<RankedItem> = items
        .iter()
        .map(|item| {
            let base = base_score(item, now, params);
            let jitter = if factor > 0.0 {
                random.next_uniform_signed() * factor * params.jitter_scale
            } else {
                0.0
            };
            RankedItem {
                item_id: item.id,
                base_score: base,
                jitter,
                final_score: base + jitter,
                next_due_at: item.next_due_at,
            }
        })
        .collect();

    ranked.sort_by(compare);

    tracing::debug!(
        candidates = ranked.len(),
        randomness = factor,
        "Ranked review queue"
    );

    ranked
}

/// Order a candidate set with the default ranking constants
pub fn rank_queue<R: RandomSource>(
    items: &[Item],
    randomness_factor: f64,
    now: DateTime<Utc>,
    random: &mut R,
) -> Vec<ItemId> {
    rank_queue_with(&RankingParameters::default(), items, randomness_factor, now, random)
}

/// Order a candidate set with explicit ranking constants
pub fn rank_queue_with<R: RandomSource>(
    params: &RankingParameters,
    items: &[Item],
    randomness_factor: f64,
    now: DateTime<Utc>,
    random: &mut R,
) -> Vec<ItemId> {
    score_queue(items, randomness_factor, now, params, random)
        .into_iter()
        .map(|ranked| ranked.item_id)
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
