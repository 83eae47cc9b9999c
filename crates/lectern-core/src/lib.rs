//! # Lectern Core
//!
//! Review scheduling engine for incremental reading. Decides *when* each
//! reading/learning item should next be reviewed and *in what order* due
//! items are presented.
//!
//! - **FSRS-5**: stability/difficulty memory model with config-replaceable weights
//! - **Rating normalization**: five-button UI ratings folded into four grades
//! - **Interval projection**: rounded, bounded, modifier-scaled due dates
//! - **Queue ranking**: priority + saturating overdue bonus + seedable jitter
//! - **SQLite persistence**: one transaction per processed rating
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lectern_core::prelude::*;
//!
//! // Create storage (uses default platform-specific location)
//! let store = SqliteItemStore::new(None)?;
//! let engine = ReviewEngine::new(store, SchedulingConfig::default());
//!
//! let item = engine.add_item(NewItem::new("Walden, ch. 2"))?;
//!
//! // Rate it GOOD (raw UI rating 3)
//! let outcome = engine.review(item.id, 3)?;
//! println!("next review in {} days", outcome.interval_days);
//!
//! // Build today's queue
//! let mut random = SeededRandom::from_entropy();
//! let queue = engine.next_items(&ItemFilter::all().due_only(Utc::now()), Utc::now(), &mut random)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): Compile SQLite into the binary
//! - `encryption`: SQLCipher; the key is read from `LECTERN_ENCRYPTION_KEY`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod clock;
pub mod config;
pub mod engine;
pub mod fsrs;
pub mod item;
pub mod queue;
pub mod schedule;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use clock::{Clock, ManualClock, SystemClock};

pub use config::{
    validate_config, ConfigError, RawSchedulingConfig, SchedulingConfig, MAX_INTERVAL_LIMIT_DAYS,
};

pub use engine::{EngineError, ReviewEngine, ReviewOutcome};

// FSRS
pub use fsrs::{
    normalize_rating, preview, update_state, Grade, GradeError, MemoryState, ModelParameters,
    PreviewResults, RatingError, ReviewState, StateUpdate,
};

pub use item::{Item, ItemFilter, ItemId, ItemKind, NewItem, RatingEvent};

// Queue
pub use queue::{
    detect_leeches, due_forecast, item_metrics, queue_stats, rank_queue, rank_queue_with,
    score_queue, DifficultyTrend, DueDay, DueForecast, ItemMetrics, NoJitter, QueueStats,
    RandomSource, RankedItem, RankingParameters, SeededRandom,
};

pub use schedule::{days_overdue, is_due, project};

pub use storage::{InMemoryItemStore, ItemStore, Result, SqliteItemStore, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FSRS algorithm version (5 = 19 parameters)
pub const FSRS_VERSION: u8 = 5;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Clock, EngineError, Grade, InMemoryItemStore, Item, ItemFilter, ItemId, ItemKind,
        ItemStore, NewItem, RandomSource, RatingEvent, ReviewEngine, ReviewOutcome,
        SchedulingConfig, SeededRandom, SqliteItemStore, SystemClock,
    };

    pub use chrono::{DateTime, Utc};
}
