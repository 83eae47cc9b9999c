//! Review engine
//!
//! Host-facing entry point. Owns the validated configuration, the item store
//! and a clock, and runs each rating through normalize -> update -> project
//! -> commit. Nothing is written unless every step before the commit
//! succeeded, and the returned item is the committed one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, SchedulingConfig};
use crate::fsrs::{
    normalize_rating, preview as preview_state, update_state, Grade, GradeError, PreviewResults,
    RatingError, ReviewState,
};
use crate::item::{Item, ItemFilter, ItemId, NewItem, RatingEvent, MAX_PRIORITY};
use crate::queue::{
    detect_leeches, due_forecast, item_metrics, queue_stats, score_queue, DueForecast, ItemMetrics,
    QueueStats, RandomSource,
};
use crate::storage::{ItemStore, StorageError};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Engine error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Raw rating outside 1..=5
    #[error(transparent)]
    InvalidRating(#[from] RatingError),
    /// Grade outside 1..=4
    #[error(transparent)]
    InvalidGrade(#[from] GradeError),
    /// Priority override outside 0..=100
    #[error("Invalid priority {0}: expected 0..=100")]
    InvalidPriority(i64),
    /// Unknown item
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),
    /// Due-date override earlier than the last review
    #[error("Invalid due date for item {item_id}: {reason}")]
    InvalidDueDate { item_id: ItemId, reason: String },
    /// The store failed or refused the write
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),
    /// Rejected configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Whether the request was rejected before anything was written
    pub fn is_validation(&self) -> bool {
        match self {
            EngineError::Persistence(err) => err.is_validation(),
            EngineError::InvalidRating(_)
            | EngineError::InvalidGrade(_)
            | EngineError::InvalidPriority(_)
            | EngineError::InvalidDueDate { .. }
            | EngineError::Config(_) => true,
            EngineError::ItemNotFound(_) => false,
        }
    }
}

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;

// ============================================================================
// OUTCOME
// ============================================================================

/// Committed result of one processed rating
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    /// Rated item
    pub item_id: ItemId,
    /// Normalized grade
    pub grade: Grade,
    /// Scheduled interval in whole days
    pub interval_days: i64,
    /// New due date
    pub next_due_at: DateTime<Utc>,
    /// New stability
    pub stability: f64,
    /// New difficulty
    pub difficulty: f64,
    /// Recall probability at review time
    pub retrievability: f64,
    /// Reviews processed so far, including this one
    pub review_count: u32,
    /// Appended log entry
    pub event: RatingEvent,
    /// Item as committed
    pub item: Item,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Scheduling engine over an item store
///
/// All methods take `&self`. Updates to the same item must be serialized by
/// the host; the store's review-count check rejects a lost race instead of
/// applying it twice.
pub struct ReviewEngine<S, C = SystemClock> {
    config: SchedulingConfig,
    store: S,
    clock: C,
}

impl<S: ItemStore> ReviewEngine<S, SystemClock> {
    /// Engine using wall-clock time
    pub fn new(store: S, config: SchedulingConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: ItemStore, C: Clock> ReviewEngine<S, C> {
    /// Engine with an injected clock
    pub fn with_clock(store: S, config: SchedulingConfig, clock: C) -> Self {
        Self {
            config,
            store,
            clock,
        }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn require_item(&self, item_id: ItemId) -> Result<Item> {
        self.store
            .load_item(item_id)?
            .ok_or(EngineError::ItemNotFound(item_id))
    }

    /// Import a new item stamped with the clock's time
    pub fn add_item(&self, input: NewItem) -> Result<Item> {
        if input.priority > MAX_PRIORITY {
            return Err(EngineError::InvalidPriority(i64::from(input.priority)));
        }
        let item = self.store.insert_item(input, self.clock.now())?;
        tracing::info!(item_id = item.id, title = %item.title, "Added item");
        Ok(item)
    }

    // ========================================================================
    // RATINGS
    // ========================================================================

    /// Process one raw UI rating at `now`
    pub fn process_rating(
        &self,
        item_id: ItemId,
        raw_rating: i64,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome> {
        let grade = normalize_rating(raw_rating).inspect_err(|_| {
            tracing::warn!(item_id, raw_rating, "Rejected rating");
        })?;
        let item = self.require_item(item_id)?;

        let state = ReviewState::from_item(&item);
        let update = update_state(&state, grade, now, &self.config);

        let mut updated = item.clone();
        updated.stability = Some(update.stability);
        updated.difficulty = Some(update.difficulty);
        updated.last_reviewed_at = Some(now);
        updated.next_due_at = Some(update.next_due_at);
        updated.review_count = item.review_count + 1;

        let event = RatingEvent {
            id: Uuid::new_v4(),
            item_id,
            // normalize_rating accepted it, so it fits
            raw_rating: raw_rating as u8,
            grade,
            timestamp: now,
            elapsed_days: update.elapsed_days,
            retrievability: update.retrievability,
            resulting_interval_days: update.interval_days,
            resulting_next_due_at: update.next_due_at,
            stability_after: update.stability,
            difficulty_after: update.difficulty,
        };

        self.store
            .save_item_and_log(&updated, &event)
            .inspect_err(|e| {
                tracing::warn!(item_id, error = %e, "Failed to commit rating");
            })?;

        tracing::info!(
            item_id,
            grade = %grade,
            interval_days = update.interval_days,
            stability = update.stability,
            difficulty = update.difficulty,
            "Committed rating"
        );

        Ok(ReviewOutcome {
            item_id,
            grade,
            interval_days: update.interval_days,
            next_due_at: update.next_due_at,
            stability: update.stability,
            difficulty: update.difficulty,
            retrievability: update.retrievability,
            review_count: updated.review_count,
            event,
            item: updated,
        })
    }

    /// Process one raw UI rating at the clock's current time
    pub fn review(&self, item_id: ItemId, raw_rating: i64) -> Result<ReviewOutcome> {
        self.process_rating(item_id, raw_rating, self.clock.now())
    }

    /// What each grade would do, without writing anything
    pub fn preview(&self, item_id: ItemId, now: DateTime<Utc>) -> Result<PreviewResults> {
        let item = self.require_item(item_id)?;
        Ok(preview_state(&ReviewState::from_item(&item), now, &self.config))
    }

    /// Full rating log of one item, oldest first
    pub fn rating_history(&self, item_id: ItemId) -> Result<Vec<RatingEvent>> {
        self.require_item(item_id)?;
        Ok(self.store.rating_events(Some(item_id))?)
    }

    // ========================================================================
    // QUEUE
    // ========================================================================

    /// Candidates for `filter` in presentation order, using the configured
    /// randomness factor
    pub fn next_items<R: RandomSource>(
        &self,
        filter: &ItemFilter,
        now: DateTime<Utc>,
        random: &mut R,
    ) -> Result<Vec<Item>> {
        self.next_items_with(filter, self.config.randomness_factor(), now, random)
    }

    /// Like [`next_items`](Self::next_items) with an explicit randomness
    /// factor (clamped to [0, 1])
    pub fn next_items_with<R: RandomSource>(
        &self,
        filter: &ItemFilter,
        randomness_factor: f64,
        now: DateTime<Utc>,
        random: &mut R,
    ) -> Result<Vec<Item>> {
        let candidates = self.store.load_items(filter)?;
        let ranked = score_queue(
            &candidates,
            randomness_factor,
            now,
            self.config.ranking(),
            random,
        );

        let mut by_id: HashMap<ItemId, Item> =
            candidates.into_iter().map(|item| (item.id, item)).collect();
        Ok(ranked
            .into_iter()
            .filter_map(|entry| by_id.remove(&entry.item_id))
            .collect())
    }

    // ========================================================================
    // OVERRIDES
    // ========================================================================

    /// Manually set the queue priority
    pub fn set_priority(&self, item_id: ItemId, priority: i64) -> Result<Item> {
        let priority = u8::try_from(priority)
            .ok()
            .filter(|p| *p <= MAX_PRIORITY)
            .ok_or(EngineError::InvalidPriority(priority))?;
        self.require_item(item_id)?;

        let item = self.store.set_priority(item_id, priority)?;
        tracing::info!(item_id, priority, "Priority overridden");
        Ok(item)
    }

    /// Manually move the due date
    ///
    /// The new date may not precede the last review. Memory state is left
    /// untouched; the next rating measures elapsed time from the last review
    /// as usual.
    pub fn reschedule(&self, item_id: ItemId, next_due_at: DateTime<Utc>) -> Result<Item> {
        let item = self.require_item(item_id)?;
        if let Some(last) = item.last_reviewed_at {
            if next_due_at < last {
                return Err(EngineError::InvalidDueDate {
                    item_id,
                    reason: format!(
                        "{} is before the last review at {}",
                        next_due_at.to_rfc3339(),
                        last.to_rfc3339()
                    ),
                });
            }
        }

        let item = self.store.reschedule(item_id, next_due_at)?;
        tracing::info!(item_id, next_due_at = %next_due_at, "Item rescheduled");
        Ok(item)
    }

    // ========================================================================
    // ANALYTICS
    // ========================================================================

    /// Queue counts across every stored item
    pub fn queue_stats(&self, now: DateTime<Utc>) -> Result<QueueStats> {
        let items = self.store.load_items(&ItemFilter::all())?;
        Ok(queue_stats(&items, now))
    }

    /// Per-day due forecast across every stored item
    pub fn due_forecast(&self, now: DateTime<Utc>, days: u32) -> Result<DueForecast> {
        let items = self.store.load_items(&ItemFilter::all())?;
        Ok(due_forecast(&items, now, days))
    }

    /// Items with at least `threshold` lapses
    pub fn leeches(&self, threshold: u32) -> Result<Vec<ItemId>> {
        let events = self.store.rating_events(None)?;
        Ok(detect_leeches(&events, threshold))
    }

    /// Review performance of one item from its rating log
    pub fn item_metrics(&self, item_id: ItemId) -> Result<ItemMetrics> {
        let events = self.rating_history(item_id)?;
        Ok(item_metrics(&events))
    }
}

// ============================================================================
// TESTS
// ============================================================================
