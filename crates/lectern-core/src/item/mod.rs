//! Item module - Core data types
//!
//! - Items with their memory-model state and schedule
//! - The append-only rating log
//! - Candidate filters applied at the store boundary

mod event;
mod node;

pub use event::RatingEvent;
pub use node::{DEFAULT_PRIORITY, Item, ItemId, ItemKind, MAX_PRIORITY, NewItem};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CANDIDATE FILTER
// ============================================================================

/// Selects the candidate set handed to the queue ranker
///
/// Filtering is the store's job; the ranker only orders what it receives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilter {
    /// Only items in this category
    pub category_id: Option<i64>,
    /// Only items of this kind
    pub kind: Option<ItemKind>,
    /// Only items that are new or due at this instant
    pub due_at: Option<DateTime<Utc>>,
    /// Only favorites
    pub favorites_only: bool,
    /// Maximum number of items to load
    pub limit: Option<usize>,
}

impl ItemFilter {
    /// Filter that accepts every item
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one category
    pub fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Restrict to one content kind
    pub fn kind(mut self, kind: ItemKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restrict to items that are new or due at `now`
    pub fn due_only(mut self, now: DateTime<Utc>) -> Self {
        self.due_at = Some(now);
        self
    }

    /// Restrict to favorites
    pub fn favorites(mut self) -> Self {
        self.favorites_only = true;
        self
    }

    /// Cap the number of loaded items
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether an item passes every predicate (the limit is not a predicate)
    pub fn matches(&self, item: &Item) -> bool {
        if self.category_id.is_some() && item.category_id != self.category_id {
            return false;
        }
        if self.kind.is_some_and(|kind| item.kind != kind) {
            return false;
        }
        if self.favorites_only && !item.favorite {
            return false;
        }
        match self.due_at {
            Some(now) => crate::schedule::is_due(item, now),
            None => true,
        }
    }
}
