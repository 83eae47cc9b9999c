//! Review grades and the rating normalizer
//!
//! The reading UI offers five rating buttons while the memory model works
//! with four grades. Normalization folds ratings 3 and 4 into GOOD.

use serde::{Deserialize, Serialize};

/// Lowest rating the UI can submit
pub const MIN_RAW_RATING: i64 = 1;
/// Highest rating the UI can submit
pub const MAX_RAW_RATING: i64 = 5;

/// Raw rating outside the accepted 1..=5 range
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RatingError {
    /// The submitted rating cannot be mapped to a grade
    #[error("Invalid rating {0}: expected a value between 1 and 5")]
    InvalidRating(i64),
}

/// Numeric grade outside the canonical 1..=4 range
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GradeError {
    /// The value does not name one of the four grades
    #[error("Invalid grade {0}: expected a value between 1 and 4")]
    InvalidGrade(u8),
}

/// Canonical review grade consumed by the memory model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    /// Forgotten; the item lapses
    Again = 1,
    /// Recalled with serious effort
    Hard = 2,
    /// Recalled after a short hesitation
    Good = 3,
    /// Recalled effortlessly
    Easy = 4,
}

impl Grade {
    /// All grades from worst to best
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    /// Numeric value (1..=4) used by the formulas
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Zero-based index into per-grade tables
    pub fn index(self) -> usize {
        self as usize - 1
    }

    /// Whether the grade counts as a successful recall
    pub fn is_success(self) -> bool {
        self != Grade::Again
    }

    /// String representation
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }

    /// Map a raw 1..=5 UI rating onto a grade.
    ///
    /// 1 → AGAIN, 2 → HARD, 3 and 4 → GOOD, 5 → EASY.
    pub fn from_raw_rating(raw: i64) -> Result<Self, RatingError> {
        match raw {
            1 => Ok(Grade::Again),
            2 => Ok(Grade::Hard),
            3 | 4 => Ok(Grade::Good),
            5 => Ok(Grade::Easy),
            other => Err(RatingError::InvalidRating(other)),
        }
    }
}

impl TryFrom<u8> for Grade {
    type Error = GradeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Grade::Again),
            2 => Ok(Grade::Hard),
            3 => Ok(Grade::Good),
            4 => Ok(Grade::Easy),
            other => Err(GradeError::InvalidGrade(other)),
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "again" => Ok(Grade::Again),
            "hard" => Ok(Grade::Hard),
            "good" => Ok(Grade::Good),
            "easy" => Ok(Grade::Easy),
            _ => Err(format!("Unknown grade: {}", s)),
        }
    }
}

/// Normalize a raw UI rating (1..=5) into a grade
pub fn normalize_rating(raw: i64) -> Result<Grade, RatingError> {
    Grade::from_raw_rating(raw)
}
