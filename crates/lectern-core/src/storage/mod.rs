//! Storage Module
//!
//! The item store is the engine's only I/O boundary:
//! - Candidate loading with filters applied at the query
//! - Atomic commit of an updated item plus its rating event
//! - Manual priority and due-date overrides
//!
//! [`SqliteItemStore`] is the durable implementation; [`InMemoryItemStore`]
//! serves hosts and tests that need no database.

mod memory;
mod migrations;
mod sqlite;

use chrono::{DateTime, Utc};

use crate::item::{Item, ItemFilter, ItemId, NewItem, RatingEvent};

pub use memory::InMemoryItemStore;
pub use migrations::{apply_migrations, get_current_version, Migration, MIGRATIONS};
pub use sqlite::SqliteItemStore;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Item not found
    #[error("Item not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// Write rejected because the data is inconsistent with the stored state
    #[error("Validation error: {0}")]
    Validation(String),
}

impl StorageError {
    /// Whether the store refused the data, as opposed to failing to store it
    pub fn is_validation(&self) -> bool {
        matches!(self, StorageError::Validation(_))
    }
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// ITEM STORE
// ============================================================================

/// Persistence boundary of the review engine
///
/// Implementations must be `Send + Sync`; every method takes `&self`.
pub trait ItemStore: Send + Sync {
    /// Items passing `filter`, ordered by id, truncated to `filter.limit`
    fn load_items(&self, filter: &ItemFilter) -> Result<Vec<Item>>;

    /// One item by id
    fn load_item(&self, id: ItemId) -> Result<Option<Item>>;

    /// Write the updated item and append its rating event as one unit.
    ///
    /// Either both become visible or neither does. Rejects with
    /// [`StorageError::Validation`] when `item.review_count` is not exactly
    /// one more than the stored count.
    fn save_item_and_log(&self, item: &Item, event: &RatingEvent) -> Result<()>;

    /// Import a new, never-reviewed item
    fn insert_item(&self, input: NewItem, created_at: DateTime<Utc>) -> Result<Item>;

    /// Overwrite the queue priority
    fn set_priority(&self, id: ItemId, priority: u8) -> Result<Item>;

    /// Overwrite the due date
    fn reschedule(&self, id: ItemId, next_due_at: DateTime<Utc>) -> Result<Item>;

    /// Rating log, oldest first; `None` returns the log of every item
    fn rating_events(&self, item_id: Option<ItemId>) -> Result<Vec<RatingEvent>>;
}

impl<S: ItemStore + ?Sized> ItemStore for std::sync::Arc<S> {
    fn load_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        (**self).load_items(filter)
    }

    fn load_item(&self, id: ItemId) -> Result<Option<Item>> {
        (**self).load_item(id)
    }

    fn save_item_and_log(&self, item: &Item, event: &RatingEvent) -> Result<()> {
        (**self).save_item_and_log(item, event)
    }

    fn insert_item(&self, input: NewItem, created_at: DateTime<Utc>) -> Result<Item> {
        (**self).insert_item(input, created_at)
    }

    fn set_priority(&self, id: ItemId, priority: u8) -> Result<Item> {
        (**self).set_priority(id, priority)
    }

    fn reschedule(&self, id: ItemId, next_due_at: DateTime<Utc>) -> Result<Item> {
        (**self).reschedule(id, next_due_at)
    }

    fn rating_events(&self, item_id: Option<ItemId>) -> Result<Vec<RatingEvent>> {
        (**self).rating_events(item_id)
    }
}

/// Check that `item` is the direct successor of the stored state
pub(crate) fn check_successor(stored: &Item, item: &Item, event: &RatingEvent) -> Result<()> {
    if event.item_id != item.id {
        return Err(StorageError::Validation(format!(
            "rating event belongs to item {} but item {} was saved",
            event.item_id, item.id
        )));
    }
    if item.review_count != stored.review_count + 1 {
        return Err(StorageError::Validation(format!(
            "item {} review count {} does not follow stored count {}",
            item.id, item.review_count, stored.review_count
        )));
    }
    Ok(())
}
