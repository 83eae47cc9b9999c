//! FSRS-5 (Free Spaced Repetition Scheduler) Module
//!
//! Memory model behind the review scheduler.
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki
//!
//! ## Core Formulas:
//! - Retrievability: R = (1 + FACTOR * t / S)^DECAY where FACTOR = 0.9^(1/DECAY) - 1
//! - Interval: t = S/FACTOR * (R^(1/DECAY) - 1)
//!
//! Raw UI ratings (1-5) are first normalized to one of four [`Grade`]s.

mod algorithm;
mod grade;
mod scheduler;

pub use algorithm::{
    // Core functions
    initial_difficulty,
    initial_stability,
    next_difficulty,
    next_forget_stability,
    next_interval,
    next_recall_stability,
    retrievability,
    // Parameters
    ModelParameters,
    // Constants
    DEFAULT_DECAY,
    DEFAULT_LAPSE_CEILING,
    DEFAULT_RETENTION,
    FSRS5_WEIGHTS,
    MAX_DIFFICULTY,
    MIN_DIFFICULTY,
    MIN_STABILITY,
};

pub use grade::{normalize_rating, Grade, GradeError, RatingError, MAX_RAW_RATING, MIN_RAW_RATING};

pub use scheduler::{preview, update_state, MemoryState, PreviewResults, ReviewState, StateUpdate};
