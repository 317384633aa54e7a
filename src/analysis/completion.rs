//! Completion assessment: is the profile good enough to start research?
//!
//! `confidence = w_b * breadth + w_d * depth + w_p * progress - gap penalties`,
//! clamped to `[0, 1]`. Reaching the turn budget always yields `sufficient`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::gaps::{Gap, GapPriority, IMPORTANT_CATEGORIES};
use crate::interview::{ConversationState, ProfileValue, Score};
use crate::workspace::ScoringSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Continue,
    MinimalSufficient,
    Sufficient,
}

impl Recommendation {
    pub fn should_stop(self) -> bool {
        matches!(self, Recommendation::Sufficient)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::Continue => "continue",
            Recommendation::MinimalSufficient => "minimal_sufficient",
            Recommendation::Sufficient => "sufficient",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub confidence: Score,
    pub gaps: Vec<Gap>,
    pub missing_categories: Vec<String>,
    pub recommendation: Recommendation,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssessmentError {
    #[error("invalid scoring settings: {0}")]
    InvalidSettings(String),

    #[error("{0} evaluated to a non-finite value")]
    NonFinite(&'static str),
}

/// Intermediate scores, exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub breadth: f64,
    pub depth: f64,
    pub progress: f64,
    pub penalty: f64,
}

pub struct CompletionAssessor {
    settings: ScoringSettings,
}

impl CompletionAssessor {
    pub fn new(settings: ScoringSettings) -> Self {
        Self { settings }
    }

    /// Scores `state` against the supplied gaps. Never fails: internal errors
    /// produce a `continue` result at the configured fallback confidence.
    pub fn assess(&self, state: &ConversationState, gaps: &[Gap]) -> CompletionResult {
        let missing_categories: Vec<String> = IMPORTANT_CATEGORIES
            .iter()
            .filter(|category| !state.has_category(category))
            .map(|category| category.to_string())
            .collect();
        let turn_count = state.turn_count();
        let at_cap = turn_count >= state.max_turns;

        let mut result = match self.score(state, gaps) {
            Ok((confidence, breakdown)) => {
                let recommendation = self.recommend(confidence);
                CompletionResult {
                    confidence,
                    gaps: gaps.to_vec(),
                    missing_categories,
                    recommendation,
                    reasoning: format!(
                        "breadth {:.2}, depth {:.2}, progress {:.2}, gap penalty {:.2} after {} turn(s)",
                        breakdown.breadth,
                        breakdown.depth,
                        breakdown.progress,
                        breakdown.penalty,
                        turn_count
                    ),
                }
            }
            Err(err) => {
                warn!(error = %err, session_id = %state.session_id, "completion assessment failed; using fallback");
                self.fallback(gaps, missing_categories, &err)
            }
        };

        if at_cap {
            result.recommendation = Recommendation::Sufficient;
            result.reasoning = format!(
                "turn budget of {} reached; {}",
                state.max_turns, result.reasoning
            );
        }
        debug!(
            session_id = %state.session_id,
            confidence = %result.confidence,
            recommendation = %result.recommendation,
            "completion assessed"
        );
        result
    }

    /// Computes the raw confidence and its components.
    pub fn score(
        &self,
        state: &ConversationState,
        gaps: &[Gap],
    ) -> Result<(Score, ScoreBreakdown), AssessmentError> {
        self.validate_settings()?;
        let breakdown = ScoreBreakdown {
            breadth: self.breadth(state),
            depth: self.depth(state),
            progress: progress_for_turns(state.turn_count()),
            penalty: self.gap_penalty(gaps),
        };
        let s = &self.settings;
        let base = s.breadth_weight * breakdown.breadth
            + s.depth_weight * breakdown.depth
            + s.progress_weight * breakdown.progress;
        let confidence = base - breakdown.penalty;
        if !confidence.is_finite() {
            return Err(AssessmentError::NonFinite("confidence"));
        }
        Ok((Score::saturating(confidence), breakdown))
    }

    pub fn recommend(&self, confidence: Score) -> Recommendation {
        let value = confidence.value();
        if value >= self.settings.sufficient_threshold {
            Recommendation::Sufficient
        } else if value >= self.settings.minimal_threshold {
            Recommendation::MinimalSufficient
        } else {
            Recommendation::Continue
        }
    }

    fn breadth(&self, state: &ConversationState) -> f64 {
        let present = IMPORTANT_CATEGORIES
            .iter()
            .filter(|category| state.has_category(category))
            .count();
        let fraction = present as f64 / IMPORTANT_CATEGORIES.len() as f64;
        let has_any = state.profile.values().any(|value| !value.is_empty());
        if has_any {
            fraction.max(self.settings.breadth_floor)
        } else {
            fraction
        }
    }

    fn depth(&self, state: &ConversationState) -> f64 {
        let scores: Vec<f64> = state
            .profile
            .values()
            .filter(|value| !value.is_empty())
            .map(|value| self.richness(value))
            .collect();
        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }

    /// Per-value richness in `[0, 1]`.
    pub fn richness(&self, value: &ProfileValue) -> f64 {
        let s = &self.settings;
        match value {
            ProfileValue::Text(text) => normalized(text.trim().chars().count(), s.text_richness_cap),
            ProfileValue::List(items) => normalized(
                items.iter().filter(|item| !item.trim().is_empty()).count(),
                s.list_richness_cap,
            ),
            ProfileValue::Map(entries) => normalized(entries.len(), s.map_richness_cap),
        }
    }

    fn gap_penalty(&self, gaps: &[Gap]) -> f64 {
        gaps.iter()
            .map(|gap| match gap.priority {
                GapPriority::Critical => self.settings.critical_gap_penalty,
                GapPriority::Important => self.settings.important_gap_penalty,
                GapPriority::NiceToHave => 0.0,
            })
            .sum()
    }

    fn validate_settings(&self) -> Result<(), AssessmentError> {
        let s = &self.settings;
        let weights = [
            ("breadth_weight", s.breadth_weight),
            ("depth_weight", s.depth_weight),
            ("progress_weight", s.progress_weight),
            ("critical_gap_penalty", s.critical_gap_penalty),
            ("important_gap_penalty", s.important_gap_penalty),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AssessmentError::InvalidSettings(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        if !(0.0..=1.0).contains(&s.minimal_threshold)
            || !(0.0..=1.0).contains(&s.sufficient_threshold)
            || s.minimal_threshold > s.sufficient_threshold
        {
            return Err(AssessmentError::InvalidSettings(
                "thresholds must satisfy 0 <= minimal <= sufficient <= 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&s.breadth_floor) {
            return Err(AssessmentError::InvalidSettings(
                "breadth_floor must lie in [0, 1]".into(),
            ));
        }
        Ok(())
    }

    fn fallback(
        &self,
        gaps: &[Gap],
        missing_categories: Vec<String>,
        err: &AssessmentError,
    ) -> CompletionResult {
        CompletionResult {
            confidence: Score::saturating(self.settings.fallback_confidence),
            gaps: gaps.to_vec(),
            missing_categories,
            recommendation: Recommendation::Continue,
            reasoning: format!("assessment unavailable ({err}); continuing with defaults"),
        }
    }
}

impl Default for CompletionAssessor {
    fn default() -> Self {
        Self::new(ScoringSettings::default())
    }
}

/// Step function of turn count; diminishing returns past ten turns.
pub fn progress_for_turns(turns: usize) -> f64 {
    match turns {
        0 => 0.0,
        1..=2 => 0.3,
        3..=5 => 0.7,
        6..=9 => 1.0,
        _ => 0.8,
    }
}

fn normalized(amount: usize, cap: usize) -> f64 {
    if cap == 0 {
        return 1.0;
    }
    (amount as f64 / cap as f64).min(1.0)
}
