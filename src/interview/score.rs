//! Validated unit-interval scores.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::StateError;

/// A confidence, priority, or completion value guaranteed to lie in `[0.0, 1.0]`.
///
/// Serialized as a bare float; deserialization runs the same range check as
/// [`Score::new`], so a tampered session file cannot smuggle in `1.7`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    pub const ZERO: Score = Score(0.0);
    pub const ONE: Score = Score(1.0);

    pub fn new(value: f64) -> Result<Self, StateError> {
        Self::for_field("score", value)
    }

    /// Like [`Score::new`] but names the offending field in the error.
    pub fn for_field(field: &str, value: f64) -> Result<Self, StateError> {
        if !value.is_finite() {
            return Err(StateError::NotFinite {
                field: field.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(StateError::ScoreOutOfRange {
                field: field.to_string(),
                value,
            });
        }
        Ok(Self(value))
    }

    /// Clamps an already-computed finite value into range. Only for derived
    /// aggregates whose formula is allowed to overshoot (e.g. gap penalties).
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Score {
    type Error = StateError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
