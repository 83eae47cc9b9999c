//! FSRS memory-model formulas
//!
//! Pure functions over stability, difficulty and retrievability. All
//! constants come from [`ModelParameters`] so a host can swap in an
//! optimized parameter set.

use serde::{Deserialize, Serialize};

use super::grade::Grade;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Published FSRS-5 default weights
///
/// - w0-w3: initial stability per grade
/// - w4-w7: initial difficulty and difficulty update
/// - w8-w10: recall stability growth
/// - w11-w14: post-lapse stability
/// - w15-w16: hard penalty, easy bonus
/// - w17-w18: short-term terms (kept for parameter-set compatibility)
pub const FSRS5_WEIGHTS: [f64; 19] = [
    0.40255, 1.18385, 3.173, 15.69105, // w0-w3
    7.1949, 0.5345, 1.4604, 0.0046, // w4-w7
    1.54575, 0.1192, 1.01925, // w8-w10
    1.9395, 0.11, 0.29605, 2.2698, // w11-w14
    0.2315, 2.9898, // w15-w16
    0.51655, 0.6621, // w17-w18
];

/// Forgetting curve exponent P (must be negative)
pub const DEFAULT_DECAY: f64 = -0.5;

/// Retrievability reached after exactly one stability interval
pub const DEFAULT_RETENTION: f64 = 0.9;

/// Lower difficulty bound
pub const MIN_DIFFICULTY: f64 = 1.0;

/// Upper difficulty bound
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Stability never drops below this floor
pub const MIN_STABILITY: f64 = 0.1;

/// Largest fraction of prior stability a lapse may keep
pub const DEFAULT_LAPSE_CEILING: f64 = 0.9;

// ============================================================================
// PARAMETERS
// ============================================================================

/// Replaceable constant set for the memory model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ModelParameters {
    /// FSRS weight vector
    pub weights: [f64; 19],
    /// Forgetting curve exponent P
    pub decay: f64,
    /// Stability floor
    pub min_stability: f64,
    /// Post-lapse stability is at most `lapse_ceiling * S`
    pub lapse_ceiling: f64,
    /// Lower difficulty bound
    pub min_difficulty: f64,
    /// Upper difficulty bound
    pub max_difficulty: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            weights: FSRS5_WEIGHTS,
            decay: DEFAULT_DECAY,
            min_stability: MIN_STABILITY,
            lapse_ceiling: DEFAULT_LAPSE_CEILING,
            min_difficulty: MIN_DIFFICULTY,
            max_difficulty: MAX_DIFFICULTY,
        }
    }
}

impl ModelParameters {
    /// Forgetting curve factor F, chosen so that R(t = S) = 0.9
    pub fn factor(&self) -> f64 {
        DEFAULT_RETENTION.powf(1.0 / self.decay) - 1.0
    }

    /// Clamp a difficulty into the configured bounds
    pub fn clamp_difficulty(&self, difficulty: f64) -> f64 {
        difficulty.clamp(self.min_difficulty, self.max_difficulty)
    }

    /// Collect every problem with this parameter set
    pub(crate) fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if let Some(i) = self.weights.iter().position(|w| !w.is_finite()) {
            violations.push(format!("model.weights[{}] must be finite", i));
        }
        if !(self.decay.is_finite() && self.decay < 0.0) {
            violations.push(format!("model.decay must be negative (got {})", self.decay));
        }
        if !(self.min_stability.is_finite() && self.min_stability > 0.0) {
            violations.push(format!(
                "model.minStability must be positive (got {})",
                self.min_stability
            ));
        }
        if !(self.lapse_ceiling.is_finite() && self.lapse_ceiling > 0.0 && self.lapse_ceiling < 1.0)
        {
            violations.push(format!(
                "model.lapseCeiling must lie strictly between 0 and 1 (got {})",
                self.lapse_ceiling
            ));
        }
        if !(self.min_difficulty.is_finite() && self.min_difficulty > 0.0) {
            violations.push(format!(
                "model.minDifficulty must be positive (got {})",
                self.min_difficulty
            ));
        }
        if !(self.max_difficulty.is_finite() && self.max_difficulty > self.min_difficulty) {
            violations.push(format!(
                "model.maxDifficulty must exceed minDifficulty (got {} <= {})",
                self.max_difficulty, self.min_difficulty
            ));
        }

        let initial = &self.weights[0..4];
        if initial.iter().any(|w| *w <= 0.0) {
            violations.push("model.weights[0..4] (initial stability) must be positive".to_string());
        } else if !initial.windows(2).all(|pair| pair[0] < pair[1]) {
            violations.push(
                "model.weights[0..4] (initial stability) must increase with grade".to_string(),
            );
        }

        violations
    }
}

// ============================================================================
// CORE FORMULAS
// ============================================================================

/// Probability of recall after `elapsed_days` with the given stability.
///
/// `R = (1 + F * t / S)^P`, clamped to [0, 1].
pub fn retrievability(params: &ModelParameters, elapsed_days: f64, stability: f64) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    let t = elapsed_days.max(0.0);
    (1.0 + params.factor() * t / stability)
        .powf(params.decay)
        .clamp(0.0, 1.0)
}

/// Initial stability for a new item
pub fn initial_stability(params: &ModelParameters, grade: Grade) -> f64 {
    params.weights[grade.index()].max(params.min_stability)
}

/// Initial difficulty for a new item: `w4 - e^(w5 * (g - 1)) + 1`
pub fn initial_difficulty(params: &ModelParameters, grade: Grade) -> f64 {
    let w = &params.weights;
    let g = f64::from(grade.value());
    params.clamp_difficulty(w[4] - (w[5] * (g - 1.0)).exp() + 1.0)
}

/// Difficulty after a review.
///
/// The step shrinks linearly as difficulty approaches its upper bound, then
/// the result reverts slightly toward the EASY initial difficulty.
pub fn next_difficulty(params: &ModelParameters, difficulty: f64, grade: Grade) -> f64 {
    let w = &params.weights;
    let g = f64::from(grade.value());
    let span = params.max_difficulty - params.min_difficulty;

    let delta = -w[6] * (g - 3.0);
    let damped = difficulty + delta * (params.max_difficulty - difficulty) / span;
    let anchor = initial_difficulty(params, Grade::Easy);

    params.clamp_difficulty(w[7] * anchor + (1.0 - w[7]) * damped)
}

/// Stability after a successful recall (HARD, GOOD or EASY).
///
/// The boost grows as retrievability drops, shrinks as stability grows,
/// and is scaled down for HARD and up for EASY.
pub fn next_recall_stability(
    params: &ModelParameters,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    grade: Grade,
) -> f64 {
    let w = &params.weights;
    let hard_penalty = if grade == Grade::Hard { w[15] } else { 1.0 };
    let easy_bonus = if grade == Grade::Easy { w[16] } else { 1.0 };

    let boost = w[8].exp()
        * (params.max_difficulty + 1.0 - difficulty)
        * stability.powf(-w[9])
        * ((1.0 - retrievability) * w[10]).exp_m1()
        * hard_penalty
        * easy_bonus;

    (stability * (1.0 + boost)).max(params.min_stability)
}

/// Stability after a lapse (AGAIN).
///
/// Always below the prior stability unless the floor is reached.
pub fn next_forget_stability(
    params: &ModelParameters,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
) -> f64 {
    let w = &params.weights;
    let candidate = w[11]
        * difficulty.powf(-w[12])
        * ((stability + 1.0).powf(w[13]) - 1.0)
        * ((1.0 - retrievability) * w[14]).exp();

    candidate
        .min(stability * params.lapse_ceiling)
        .max(params.min_stability)
}

/// Unrounded interval (days) at which retrievability falls to `target_retention`.
///
/// `t = S / F * (r^(1/P) - 1)`
pub fn next_interval(params: &ModelParameters, stability: f64, target_retention: f64) -> f64 {
    stability / params.factor() * (target_retention.powf(1.0 / params.decay) - 1.0)
}

// ============================================================================
// TESTS
// ============================================================================
