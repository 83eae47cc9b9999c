//! Review state updates
//!
//! Turns a snapshot of an item's memory state plus a grade into the new
//! stability, difficulty, interval and due date. Nothing here touches
//! storage; the caller commits the returned [`StateUpdate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::{
    initial_difficulty, initial_stability, next_difficulty, next_forget_stability,
    next_interval, next_recall_stability, retrievability,
};
use super::grade::Grade;
use crate::config::SchedulingConfig;
use crate::item::Item;
use crate::schedule::{constrain_interval, elapsed_days, project};

// ============================================================================
// STATE TYPES
// ============================================================================

/// Memory-model parameters of an item that has been rated at least once
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    /// Days until retrievability decays to 90%
    pub stability: f64,
    /// Intrinsic hardness
    pub difficulty: f64,
}

/// Immutable snapshot consumed by [`update_state`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReviewState {
    /// `None` for new items
    pub memory: Option<MemoryState>,
    /// Time of the previous review
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl ReviewState {
    /// State of a never-reviewed item
    pub fn new_item() -> Self {
        Self::default()
    }

    /// Snapshot the scheduling fields of an item
    pub fn from_item(item: &Item) -> Self {
        Self {
            memory: item.memory_state(),
            last_reviewed_at: item.last_reviewed_at,
        }
    }

    /// Whether no rating has been processed yet
    pub fn is_new(&self) -> bool {
        self.memory.is_none()
    }
}

/// Result of one state update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    /// Grade that produced this update
    pub grade: Grade,
    /// New stability
    pub stability: f64,
    /// New difficulty
    pub difficulty: f64,
    /// Scheduled interval in whole days
    pub interval_days: i64,
    /// `now + interval_days`
    pub next_due_at: DateTime<Utc>,
    /// Recall probability at review time (1.0 for new items)
    pub retrievability: f64,
    /// Days since the previous review
    pub elapsed_days: f64,
}

/// Outcomes for every grade from the same starting state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResults {
    /// Outcome if rated AGAIN
    pub again: StateUpdate,
    /// Outcome if rated HARD
    pub hard: StateUpdate,
    /// Outcome if rated GOOD
    pub good: StateUpdate,
    /// Outcome if rated EASY
    pub easy: StateUpdate,
}

impl PreviewResults {
    /// Outcome for one grade
    pub fn for_grade(&self, grade: Grade) -> &StateUpdate {
        match grade {
            Grade::Again => &self.again,
            Grade::Hard => &self.hard,
            Grade::Good => &self.good,
            Grade::Easy => &self.easy,
        }
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// Apply one graded review to a state snapshot.
///
/// # Panics
///
/// Panics if the formulas produce a non-finite or non-positive stability,
/// a difficulty outside the configured bounds, or an interval outside the
/// configured range. These indicate a broken parameter set, not bad input.
pub fn update_state(
    state: &ReviewState,
    grade: Grade,
    now: DateTime<Utc>,
    config: &SchedulingConfig,
) -> StateUpdate {
    let params = config.model();

    let (stability, difficulty, recall_probability, elapsed) = match state.memory {
        None => (
            initial_stability(params, grade),
            initial_difficulty(params, grade),
            1.0,
            0.0,
        ),
        Some(memory) => {
            let elapsed = state
                .last_reviewed_at
                .map(|last| elapsed_days(last, now))
                .unwrap_or(0.0);
            let r = retrievability(params, elapsed, memory.stability);
            let difficulty = next_difficulty(params, memory.difficulty, grade);
            let stability = if grade == Grade::Again {
                next_forget_stability(params, difficulty, memory.stability, r)
            } else {
                next_recall_stability(params, difficulty, memory.stability, r, grade)
            };
            (stability, difficulty, r, elapsed)
        }
    };

    assert!(
        stability.is_finite() && stability > 0.0,
        "memory model produced invalid stability {} (grade {}, state {:?})",
        stability,
        grade,
        state
    );
    assert!(
        (params.min_difficulty..=params.max_difficulty).contains(&difficulty),
        "memory model produced difficulty {} outside [{}, {}]",
        difficulty,
        params.min_difficulty,
        params.max_difficulty
    );

    let raw_interval = next_interval(params, stability, config.target_retention());
    let interval_days = constrain_interval(raw_interval, config);
    assert!(
        (config.min_interval_days()..=config.max_interval_days()).contains(&interval_days),
        "interval {} outside [{}, {}]",
        interval_days,
        config.min_interval_days(),
        config.max_interval_days()
    );

    tracing::debug!(
        grade = %grade,
        stability,
        difficulty,
        retrievability = recall_probability,
        interval_days,
        "Computed review state update"
    );

    StateUpdate {
        grade,
        stability,
        difficulty,
        interval_days,
        next_due_at: project(interval_days, now, config),
        retrievability: recall_probability,
        elapsed_days: elapsed,
    }
}

/// Outcomes of all four grades without committing any of them
pub fn preview(state: &ReviewState, now: DateTime<Utc>, config: &SchedulingConfig) -> PreviewResults {
    PreviewResults {
        again: update_state(state, Grade::Again, now, config),
        hard: update_state(state, Grade::Hard, now, config),
        good: update_state(state, Grade::Good, now, config),
        easy: update_state(state, Grade::Easy, now, config),
    }
}

// ============================================================================
// TESTS
// ============================================================================
