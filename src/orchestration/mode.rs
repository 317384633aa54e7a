//! Interview-depth state machine.
//!
//! Four states with a turn budget each. Transitions are evaluated after every
//! turn once enough history exists; the output (new budget, whether to tell
//! the user) depends on the state *and* the triggering signal.
//!
//! Levels run QUICK < STANDARD < DEEP. ADAPTIVE sits beside STANDARD: it
//! steps down to STANDARD and up to DEEP.

use tracing::info;

use crate::analysis::{EngagementSignals, LengthTrend, QuerySignals};
use crate::interview::{ConversationState, InterviewMode, ModeTransition, TransitionTrigger};
use crate::workspace::InterviewSettings;

const QUICK_URGENCY: f64 = 0.7;
const DEEP_COMPLEXITY: f64 = 0.7;
const ADAPTIVE_ENGAGEMENT: f64 = 0.6;
const ADAPTIVE_COMPLEXITY: f64 = 0.4;

/// Result of one transition step.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub transition: ModeTransition,
    pub max_questions: usize,
    pub notify: bool,
}

impl TransitionOutcome {
    /// Message shown to the user when `notify` is set.
    pub fn notice(&self) -> String {
        format!(
            "Switching to a {} interview since {} (up to {} questions).",
            self.transition.to,
            self.transition.trigger.describe(),
            self.max_questions
        )
    }
}

pub fn step_down(mode: InterviewMode) -> Option<InterviewMode> {
    match mode {
        InterviewMode::Deep | InterviewMode::Adaptive => Some(InterviewMode::Standard),
        InterviewMode::Standard => Some(InterviewMode::Quick),
        InterviewMode::Quick => None,
    }
}

pub fn step_up(mode: InterviewMode) -> Option<InterviewMode> {
    match mode {
        InterviewMode::Quick => Some(InterviewMode::Standard),
        InterviewMode::Standard | InterviewMode::Adaptive => Some(InterviewMode::Deep),
        InterviewMode::Deep => None,
    }
}

/// Pure transition function: which mode (if any) the signals push us to.
pub fn next_mode(
    mode: InterviewMode,
    signals: &EngagementSignals,
) -> Option<(InterviewMode, TransitionTrigger)> {
    if !signals.impatience_indicators.is_empty() && mode != InterviewMode::Quick {
        return step_down(mode).map(|to| (to, TransitionTrigger::Impatience));
    }
    if signals.detail_requests > 1 && mode != InterviewMode::Deep {
        return step_up(mode).map(|to| (to, TransitionTrigger::DetailRequests));
    }
    match (signals.response_length_trend, mode) {
        (LengthTrend::Decreasing, current) if current != InterviewMode::Quick => {
            step_down(current).map(|to| (to, TransitionTrigger::ShorterResponses))
        }
        (LengthTrend::Increasing, InterviewMode::Quick) => {
            Some((InterviewMode::Standard, TransitionTrigger::LongerResponses))
        }
        _ => None,
    }
}

pub struct ModeController {
    transition_min_turns: usize,
    visible_transition_limit: usize,
    hard_turn_cap: usize,
}

impl ModeController {
    pub fn new(settings: &InterviewSettings) -> Self {
        Self {
            transition_min_turns: settings.transition_min_turns,
            visible_transition_limit: settings.visible_transition_limit,
            hard_turn_cap: settings.hard_turn_cap,
        }
    }

    /// Initial mode from the opening query's signal bundle.
    pub fn select_initial(&self, signals: &QuerySignals) -> InterviewMode {
        if signals.urgency >= QUICK_URGENCY {
            InterviewMode::Quick
        } else if signals.complexity >= DEEP_COMPLEXITY {
            InterviewMode::Deep
        } else if signals.engagement >= ADAPTIVE_ENGAGEMENT
            || signals.complexity >= ADAPTIVE_COMPLEXITY
        {
            InterviewMode::Adaptive
        } else {
            InterviewMode::Standard
        }
    }

    /// Turn budget for `mode`, bounded by the hard cap.
    pub fn budget_for(&self, mode: InterviewMode) -> usize {
        mode.max_questions().min(self.hard_turn_cap)
    }

    /// Decides the transition for the current state without mutating it.
    pub fn evaluate(
        &self,
        state: &ConversationState,
        signals: &EngagementSignals,
    ) -> Option<TransitionOutcome> {
        if state.turn_count() < self.transition_min_turns {
            return None;
        }
        let (to, trigger) = next_mode(state.mode, signals)?;
        let notify = state.mode_transitions.len() < self.visible_transition_limit;
        Some(TransitionOutcome {
            transition: ModeTransition {
                from: state.mode,
                to,
                trigger,
                at_turn: state.turn_count(),
                notified: notify,
            },
            max_questions: self.budget_for(to),
            notify,
        })
    }

    /// Evaluates and applies a transition in one step.
    pub fn update(
        &self,
        state: &mut ConversationState,
        signals: &EngagementSignals,
    ) -> Option<TransitionOutcome> {
        let outcome = self.evaluate(state, signals)?;
        info!(
            session_id = %state.session_id,
            from = %outcome.transition.from,
            to = %outcome.transition.to,
            trigger = ?outcome.transition.trigger,
            max_questions = outcome.max_questions,
            "interview mode changed"
        );
        state.record_transition(outcome.transition.clone(), self.hard_turn_cap);
        Some(outcome)
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(&InterviewSettings::default())
    }
}
