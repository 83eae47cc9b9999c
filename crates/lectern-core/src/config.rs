//! Scheduling Configuration
//!
//! [`RawSchedulingConfig`] is what hosts deserialize from disk or build by
//! hand. [`validate_config`] is the only way to obtain a
//! [`SchedulingConfig`]; every other component trusts it without checking
//! again.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::fsrs::ModelParameters;
use crate::queue::RankingParameters;

/// Default lower interval bound (days)
pub const DEFAULT_MIN_INTERVAL_DAYS: i64 = 1;
/// Default upper interval bound (days, ten years)
pub const DEFAULT_MAX_INTERVAL_DAYS: i64 = 3650;
/// Hard ceiling for `maxIntervalDays` (one hundred years)
pub const MAX_INTERVAL_LIMIT_DAYS: i64 = 36_500;
/// Default target retention
pub const DEFAULT_TARGET_RETENTION: f64 = 0.9;

// ============================================================================
// ERRORS
// ============================================================================

/// Every violation found while validating a configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid scheduling config: {}", .violations.join("; "))]
pub struct ConfigError {
    /// One human-readable message per violated rule
    pub violations: Vec<String>,
}

impl ConfigError {
    fn single(message: impl Into<String>) -> Self {
        Self {
            violations: vec![message.into()],
        }
    }
}

// ============================================================================
// RAW CONFIG
// ============================================================================

/// Unvalidated configuration as supplied by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct RawSchedulingConfig {
    /// Shortest allowed interval (days, >= 1)
    pub min_interval_days: i64,
    /// Longest allowed interval (days, >= min)
    pub max_interval_days: i64,
    /// Desired recall probability at the next review (0 < r < 1)
    pub target_retention: f64,
    /// Multiplier applied to every interval (> 0)
    pub interval_modifier: f64,
    /// Default queue randomness (0 = deterministic, 1 = most shuffled)
    pub randomness_factor: f64,
    /// Memory-model constants
    pub model: ModelParameters,
    /// Queue ranking constants
    pub ranking: RankingParameters,
}

impl Default for RawSchedulingConfig {
    fn default() -> Self {
        Self {
            min_interval_days: DEFAULT_MIN_INTERVAL_DAYS,
            max_interval_days: DEFAULT_MAX_INTERVAL_DAYS,
            target_retention: DEFAULT_TARGET_RETENTION,
            interval_modifier: 1.0,
            randomness_factor: 0.0,
            model: ModelParameters::default(),
            ranking: RankingParameters::default(),
        }
    }
}

impl RawSchedulingConfig {
    /// Parse from JSON. Unknown fields are rejected.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::single(format!("invalid JSON: {}", e)))
    }

    /// Read and parse a JSON config file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::single(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Validate into an immutable [`SchedulingConfig`]
    pub fn validate(self) -> Result<SchedulingConfig, ConfigError> {
        validate_config(self)
    }

    fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if self.min_interval_days < 1 {
            violations.push(format!(
                "minIntervalDays must be at least 1 (got {})",
                self.min_interval_days
            ));
        }
        if self.max_interval_days < self.min_interval_days {
            violations.push(format!(
                "maxIntervalDays must be >= minIntervalDays (got {} < {})",
                self.max_interval_days, self.min_interval_days
            ));
        }
        if self.max_interval_days > MAX_INTERVAL_LIMIT_DAYS {
            violations.push(format!(
                "maxIntervalDays must be at most {} (got {})",
                MAX_INTERVAL_LIMIT_DAYS, self.max_interval_days
            ));
        }
        if !(self.target_retention > 0.0 && self.target_retention < 1.0) {
            violations.push(format!(
                "targetRetention must lie strictly between 0 and 1 (got {})",
                self.target_retention
            ));
        }
        if !(self.interval_modifier.is_finite() && self.interval_modifier > 0.0) {
            violations.push(format!(
                "intervalModifier must be positive (got {})",
                self.interval_modifier
            ));
        }
        if !(0.0..=1.0).contains(&self.randomness_factor) {
            violations.push(format!(
                "randomnessFactor must lie in [0, 1] (got {})",
                self.randomness_factor
            ));
        }

        violations.extend(self.model.violations());
        violations.extend(self.ranking.violations());
        violations
    }
}

/// Validate a raw configuration, reporting every violation at once
pub fn validate_config(raw: RawSchedulingConfig) -> Result<SchedulingConfig, ConfigError> {
    let violations = raw.violations();
    if !violations.is_empty() {
        tracing::warn!(count = violations.len(), "Rejected scheduling config");
        return Err(ConfigError { violations });
    }

    Ok(SchedulingConfig {
        min_interval_days: raw.min_interval_days,
        max_interval_days: raw.max_interval_days,
        target_retention: raw.target_retention,
        interval_modifier: raw.interval_modifier,
        randomness_factor: raw.randomness_factor,
        model: raw.model,
        ranking: raw.ranking,
    })
}

// ============================================================================
// VALIDATED CONFIG
// ============================================================================

/// Validated, immutable scheduling configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingConfig {
    min_interval_days: i64,
    max_interval_days: i64,
    target_retention: f64,
    interval_modifier: f64,
    randomness_factor: f64,
    model: ModelParameters,
    ranking: RankingParameters,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            min_interval_days: DEFAULT_MIN_INTERVAL_DAYS,
            max_interval_days: DEFAULT_MAX_INTERVAL_DAYS,
            target_retention: DEFAULT_TARGET_RETENTION,
            interval_modifier: 1.0,
            randomness_factor: 0.0,
            model: ModelParameters::default(),
            ranking: RankingParameters::default(),
        }
    }
}

impl SchedulingConfig {
    /// Shortest allowed interval (days)
    pub fn min_interval_days(&self) -> i64 {
        self.min_interval_days
    }

    /// Longest allowed interval (days)
    pub fn max_interval_days(&self) -> i64 {
        self.max_interval_days
    }

    /// Desired recall probability at the next review
    pub fn target_retention(&self) -> f64 {
        self.target_retention
    }

    /// Interval multiplier
    pub fn interval_modifier(&self) -> f64 {
        self.interval_modifier
    }

    /// Default queue randomness
    pub fn randomness_factor(&self) -> f64 {
        self.randomness_factor
    }

    /// Memory-model constants
    pub fn model(&self) -> &ModelParameters {
        &self.model
    }

    /// Queue ranking constants
    pub fn ranking(&self) -> &RankingParameters {
        &self.ranking
    }

    /// Back to an editable raw form
    pub fn to_raw(&self) -> RawSchedulingConfig {
        RawSchedulingConfig {
            min_interval_days: self.min_interval_days,
            max_interval_days: self.max_interval_days,
            target_retention: self.target_retention,
            interval_modifier: self.interval_modifier,
            randomness_factor: self.randomness_factor,
            model: self.model.clone(),
            ranking: self.ranking.clone(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
