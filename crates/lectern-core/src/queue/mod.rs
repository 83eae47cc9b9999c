//! Review queue
//!
//! Ordering of candidate items plus read-only queue analytics.
//! Candidate filtering is done by the item store before anything here runs.

mod analytics;
mod random;
mod ranker;

pub use analytics::{
    detect_leeches, due_forecast, item_metrics, lapse_counts, queue_stats, DifficultyTrend, DueDay,
    DueForecast, ItemMetrics, QueueStats, DEFAULT_LEECH_THRESHOLD,
};
pub use random::{NoJitter, RandomSource, SeededRandom};
pub use ranker::{
    base_score, rank_queue, rank_queue_with, score_queue, RankedItem, RankingParameters,
    DEFAULT_JITTER_SCALE, DEFAULT_NEW_ITEM_FLOOR, DEFAULT_OVERDUE_BONUS_MAX,
    DEFAULT_OVERDUE_SCALE_DAYS,
};
