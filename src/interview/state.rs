//! Conversation state for a single personalization interview.
//!
//! The serialized form is the interchange format for persistence: a flat
//! record whose enums encode as their string value and whose timestamps are
//! ISO-8601.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProfileValue, Score, StateError};

/// Interview depth. Bounds how many questions are asked and how deep the questions go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewMode {
    Quick,
    Standard,
    Deep,
    Adaptive,
}

impl InterviewMode {
    pub const ALL: [InterviewMode; 4] = [
        InterviewMode::Quick,
        InterviewMode::Standard,
        InterviewMode::Deep,
        InterviewMode::Adaptive,
    ];

    /// Turn budget granted while in this mode.
    pub const fn max_questions(self) -> usize {
        match self {
            InterviewMode::Quick => 3,
            InterviewMode::Standard => 7,
            InterviewMode::Adaptive => 8,
            InterviewMode::Deep => 12,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InterviewMode::Quick => "quick",
            InterviewMode::Standard => "standard",
            InterviewMode::Deep => "deep",
            InterviewMode::Adaptive => "adaptive",
        }
    }

    /// Short instruction handed to the proposer describing how deep to dig.
    pub fn probing_style(self) -> &'static str {
        match self {
            InterviewMode::Quick => "Ask only the single most decision-relevant thing; keep it short.",
            InterviewMode::Standard => "Ask a focused question that fills the most important gap.",
            InterviewMode::Deep => {
                "Probe thoroughly; follow up on specifics, trade-offs and underlying reasons."
            }
            InterviewMode::Adaptive => {
                "Match the user's energy: go deeper when answers are rich, lighter when they are brief."
            }
        }
    }
}

impl fmt::Display for InterviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterviewMode {
    type Err = StateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        InterviewMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| StateError::UnknownMode(value.to_string()))
    }
}

/// How a question came to be asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Proposer question about a category we know nothing about yet.
    Exploratory,
    /// Proposer question about a category that already has some data.
    FollowUp,
    /// Deterministic fallback keyed by a gap.
    Template,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Exploratory => "exploratory",
            QuestionType::FollowUp => "follow_up",
            QuestionType::Template => "template",
        }
    }
}

impl FromStr for QuestionType {
    type Err = StateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "exploratory" => Ok(QuestionType::Exploratory),
            "follow_up" => Ok(QuestionType::FollowUp),
            "template" => Ok(QuestionType::Template),
            other => Err(StateError::UnknownQuestionType(other.to_string())),
        }
    }
}

/// One asked question and the answer it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub category: String,
    pub timestamp: DateTime<Utc>,
    pub confidence: Score,
    pub importance: Score,
    pub question_type: QuestionType,
}

/// What caused a mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    Impatience,
    DetailRequests,
    ShorterResponses,
    LongerResponses,
}

impl TransitionTrigger {
    pub fn describe(self) -> &'static str {
        match self {
            TransitionTrigger::Impatience => "you seem short on time",
            TransitionTrigger::DetailRequests => "you asked for more detail",
            TransitionTrigger::ShorterResponses => "your answers are getting shorter",
            TransitionTrigger::LongerResponses => "your answers are getting richer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeTransition {
    pub from: InterviewMode,
    pub to: InterviewMode,
    pub trigger: TransitionTrigger,
    pub at_turn: usize,
    pub notified: bool,
}

/// A fully validated turn waiting to be applied to the state.
///
/// Building one can fail; applying one cannot. That split is what keeps a turn
/// atomic: either every field lands or nothing does.
#[derive(Debug, Clone)]
pub struct TurnUpdate {
    pub turn: Turn,
    pub profile_entry: Option<(String, ProfileValue)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    pub query: String,
    #[serde(default)]
    pub profile: BTreeMap<String, ProfileValue>,
    #[serde(default)]
    pub turns: Vec<Turn>,
    #[serde(default)]
    pub priority_factors: BTreeMap<String, Score>,
    #[serde(default)]
    pub confidence_scores: BTreeMap<String, Score>,
    /// Missing categories in priority order; never contains a profile key.
    #[serde(default)]
    pub information_gaps: Vec<String>,
    pub mode: InterviewMode,
    #[serde(default)]
    pub completion_confidence: Score,
    pub max_turns: usize,
    #[serde(default)]
    pub mode_transitions: Vec<ModeTransition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(session_id: impl Into<String>, query: impl Into<String>, mode: InterviewMode) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            query: query.into(),
            profile: BTreeMap::new(),
            turns: Vec::new(),
            priority_factors: BTreeMap::new(),
            confidence_scores: BTreeMap::new(),
            information_gaps: Vec::new(),
            mode,
            completion_confidence: Score::ZERO,
            max_turns: mode.max_questions(),
            mode_transitions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn asked_questions(&self) -> Vec<&str> {
        self.turns.iter().map(|turn| turn.question.as_str()).collect()
    }

    pub fn answers(&self) -> impl Iterator<Item = &str> {
        self.turns.iter().map(|turn| turn.answer.as_str())
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.profile
            .get(category)
            .map(|value| !value.is_empty())
            .unwrap_or(false)
    }

    pub fn set_completion_confidence(&mut self, value: f64) -> Result<(), StateError> {
        self.completion_confidence = Score::for_field("completion_confidence", value)?;
        self.touch();
        Ok(())
    }

    pub fn set_confidence(&mut self, category: &str, value: f64) -> Result<(), StateError> {
        let score = Score::for_field(&format!("confidence_scores[{category}]"), value)?;
        self.confidence_scores.insert(category.to_string(), score);
        self.touch();
        Ok(())
    }

    pub fn set_priority(&mut self, category: &str, value: f64) -> Result<(), StateError> {
        let score = Score::for_field(&format!("priority_factors[{category}]"), value)?;
        self.priority_factors.insert(category.to_string(), score);
        self.touch();
        Ok(())
    }

    /// Replaces the gap list, dropping anything the profile already covers.
    pub fn set_information_gaps<I>(&mut self, gaps: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut ordered: Vec<String> = Vec::new();
        for gap in gaps {
            if !self.has_category(&gap) && !ordered.contains(&gap) {
                ordered.push(gap);
            }
        }
        self.information_gaps = ordered;
        self.touch();
    }

    /// Applies a validated turn. Infallible by construction.
    pub fn apply_turn(&mut self, update: TurnUpdate) {
        let TurnUpdate {
            turn,
            profile_entry,
        } = update;
        if let Some((category, value)) = profile_entry {
            let merged = match self.profile.remove(&category) {
                Some(existing) => existing.merge(value),
                None => value,
            };
            self.profile.insert(category.clone(), merged);
            self.confidence_scores
                .insert(category.clone(), turn.confidence);
            self.priority_factors.insert(category.clone(), turn.importance);
            self.information_gaps.retain(|gap| gap != &category);
        }
        self.turns.push(turn);
        self.touch();
    }

    /// Records a mode change and moves the turn budget with it.
    pub fn record_transition(&mut self, transition: ModeTransition, hard_cap: usize) {
        self.mode = transition.to;
        self.max_turns = transition.to.max_questions().min(hard_cap);
        self.mode_transitions.push(transition);
        self.touch();
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
