//! Test Database Manager
//!
//! Provides isolated database instances for testing:
//! - Temporary databases that are automatically cleaned up
//! - Pre-seeded databases with test data
//! - Engines driven by a manual clock
//! - Reopening to check what actually reached disk

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lectern_core::{
    Clock, Grade, Item, ItemFilter, ItemId, ItemKind, ItemStore, ManualClock, NewItem, RatingEvent,
    ReviewEngine, SchedulingConfig, SqliteItemStore,
};
use tempfile::TempDir;
use uuid::Uuid;

/// Engine type produced by the manager
pub type TestEngine = ReviewEngine<Arc<SqliteItemStore>, Arc<ManualClock>>;

/// Manager for test databases
///
/// Creates isolated database instances for each test to prevent interference.
/// Automatically cleans up temporary databases when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let db = TestDatabaseManager::new_temp(start);
/// let engine = db.engine();
/// let item = engine.add_item(NewItem::new("chapter 1"))?;
/// ```
pub struct TestDatabaseManager {
    /// The store instance
    pub store: Arc<SqliteItemStore>,
    /// Clock shared by every engine built from this manager
    pub clock: Arc<ManualClock>,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Path to the database file
    db_path: PathBuf,
}

impl TestDatabaseManager {
    /// Create a new test database in a temporary directory
    ///
    /// The database is automatically deleted when the manager is dropped.
    pub fn new_temp(start: DateTime<Utc>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_lectern.db");
        let store = SqliteItemStore::new(Some(db_path.clone())).expect("Failed to create test store");

        Self {
            store: Arc::new(store),
            clock: Arc::new(ManualClock::new(start)),
            _temp_dir: Some(temp_dir),
            db_path,
        }
    }

    /// Open (or create) a database at a caller-owned path
    pub fn new_at_path(path: PathBuf, start: DateTime<Utc>) -> Self {
        let store = SqliteItemStore::new(Some(path.clone())).expect("Failed to open test store");
        Self {
            store: Arc::new(store),
            clock: Arc::new(ManualClock::new(start)),
            _temp_dir: None,
            db_path: path,
        }
    }

    /// Engine with the default configuration
    pub fn engine(&self) -> TestEngine {
        self.engine_with(SchedulingConfig::default())
    }

    /// Engine with a custom configuration
    pub fn engine_with(&self, config: SchedulingConfig) -> TestEngine {
        ReviewEngine::with_clock(self.store.clone(), config, self.clock.clone())
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Get the number of items in the database
    pub fn item_count(&self) -> usize {
        self.store.count_items().unwrap_or(0)
    }

    /// Seed the database with plain items of increasing priority
    pub fn seed_items(&self, count: usize) -> Vec<ItemId> {
        (0..count)
            .filter_map(|i| {
                let input = NewItem {
                    title: format!("Seeded item {}", i),
                    priority: ((i * 10) % 101) as u8,
                    ..NewItem::default()
                };
                self.store.insert_item(input, self.clock.now()).ok()
            })
            .map(|item| item.id)
            .collect()
    }

    /// Seed `count_per_kind` items of every kind, alternating favorites
    pub fn seed_diverse(&self, count_per_kind: usize) -> Vec<ItemId> {
        let kinds = [ItemKind::Document, ItemKind::Extract, ItemKind::LearningItem];
        let mut ids = Vec::new();

        for (k, kind) in kinds.iter().enumerate() {
            for i in 0..count_per_kind {
                let input = NewItem {
                    title: format!("{} {}", kind, i),
                    kind: *kind,
                    priority: 50,
                    category_id: Some(k as i64 + 1),
                    favorite: i % 2 == 0,
                };
                if let Ok(item) = self.store.insert_item(input, self.clock.now()) {
                    ids.push(item.id);
                }
            }
        }

        ids
    }

    /// Store an item that already carries memory state
    ///
    /// Goes through `save_item_and_log` like a real rating, with a single
    /// GOOD event stamped at `last_reviewed_at`.
    pub fn seed_reviewed(
        &self,
        title: &str,
        stability: f64,
        difficulty: f64,
        last_reviewed_at: DateTime<Utc>,
        next_due_at: DateTime<Utc>,
    ) -> Item {
        let created_at = last_reviewed_at - chrono::Duration::days(1);
        let item = self
            .store
            .insert_item(NewItem::new(title), created_at)
            .expect("Failed to insert item");

        let mut reviewed = item.clone();
        reviewed.stability = Some(stability);
        reviewed.difficulty = Some(difficulty);
        reviewed.last_reviewed_at = Some(last_reviewed_at);
        reviewed.next_due_at = Some(next_due_at);
        reviewed.review_count = 1;

        let event = RatingEvent {
            id: Uuid::new_v4(),
            item_id: item.id,
            raw_rating: 3,
            grade: Grade::Good,
            timestamp: last_reviewed_at,
            elapsed_days: 0.0,
            retrievability: 1.0,
            resulting_interval_days: (next_due_at - last_reviewed_at).num_days(),
            resulting_next_due_at: next_due_at,
            stability_after: stability,
            difficulty_after: difficulty,
        };
        self.store
            .save_item_and_log(&reviewed, &event)
            .expect("Failed to seed reviewed item");
        reviewed
    }

    /// Drop the connections and open the same file again
    pub fn reopen(&mut self) {
        let store = SqliteItemStore::new(Some(self.db_path.clone())).expect("Failed to reopen store");
        self.store = Arc::new(store);
    }

    /// Every stored item, ordered by id
    pub fn all_items(&self) -> Vec<Item> {
        self.store.load_items(&ItemFilter::all()).expect("Failed to load items")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_temp_db_creation() {
        let db = TestDatabaseManager::new_temp(start());
        assert!(db.is_empty());
        assert!(db.path().exists());
    }

    #[test]
    fn test_seed_items() {
        let db = TestDatabaseManager::new_temp(start());
        let ids = db.seed_items(10);
        assert_eq!(ids.len(), 10);
        assert_eq!(db.item_count(), 10);
    }

    #[test]
    fn test_seed_diverse() {
        let db = TestDatabaseManager::new_temp(start());
        let ids = db.seed_diverse(4);
        assert_eq!(ids.len(), 12);

        let extracts = db
            .store
            .load_items(&ItemFilter::all().kind(ItemKind::Extract))
            .unwrap();
        assert_eq!(extracts.len(), 4);
    }

    #[test]
    fn test_seed_reviewed_item() {
        let db = TestDatabaseManager::new_temp(start());
        let last = start() - chrono::Duration::days(30);
        let item = db.seed_reviewed("reviewed", 20.0, 5.0, last, start() - chrono::Duration::days(10));

        let stored = db.store.load_item(item.id).unwrap().unwrap();
        assert_eq!(stored.stability, Some(20.0));
        assert_eq!(stored.review_count, 1);
        assert_eq!(db.store.rating_events(Some(item.id)).unwrap().len(), 1);
    }

    #[test]
    fn test_reopen_keeps_items() {
        let mut db = TestDatabaseManager::new_temp(start());
        db.seed_items(3);
        db.reopen();
        assert_eq!(db.item_count(), 3);
    }
}
