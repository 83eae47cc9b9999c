//! Rating log entries
//!
//! One [`RatingEvent`] is appended per processed rating. Entries are never
//! modified after they are written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::node::ItemId;
use crate::fsrs::Grade;

/// Immutable record of one processed rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEvent {
    /// Unique event ID (UUID v4)
    pub id: Uuid,
    /// Rated item
    pub item_id: ItemId,
    /// Rating as submitted by the UI (1..=5)
    pub raw_rating: u8,
    /// Normalized grade
    pub grade: Grade,
    /// When the rating was processed
    pub timestamp: DateTime<Utc>,
    /// Days since the previous review (0 for the first)
    pub elapsed_days: f64,
    /// Estimated recall probability at review time
    pub retrievability: f64,
    /// Interval chosen by the scheduler
    pub resulting_interval_days: i64,
    /// Due date chosen by the scheduler
    pub resulting_next_due_at: DateTime<Utc>,
    /// Stability after the update
    pub stability_after: f64,
    /// Difficulty after the update
    pub difficulty_after: f64,
}
