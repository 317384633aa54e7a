//! Bounded prompt context for the proposer.
//!
//! Long histories degrade proposer output, so the window shrinks as the
//! interview grows: the first couple of turns go out verbatim, after that
//! only the latest turns and a short profile digest are sent.

use std::fmt::Write as _;

use crate::analysis::Gap;
use crate::interview::{truncate_chars, ConversationState, InterviewMode};
use crate::workspace::InterviewSettings;

const FULL_PROFILE_VALUE_CHARS: usize = 400;
const CONDENSED_PROFILE_VALUE_CHARS: usize = 60;
const LISTED_GAPS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStyle {
    Full,
    Condensed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextWindow {
    pub style: ContextStyle,
    pub query: String,
    pub mode: InterviewMode,
    pub target: Option<Gap>,
    pub open_gaps: Vec<String>,
    pub recent_turns: Vec<(String, String)>,
    pub omitted_turns: usize,
    pub covered_categories: Vec<String>,
    pub profile_summary: Vec<String>,
}

impl ContextWindow {
    pub fn build(state: &ConversationState, gaps: &[Gap], settings: &InterviewSettings) -> Self {
        let turn_count = state.turn_count();
        let style = if turn_count <= settings.condensed_after_turns {
            ContextStyle::Full
        } else {
            ContextStyle::Condensed
        };

        let (keep, answer_chars, profile_entries, value_chars) = match style {
            ContextStyle::Full => (
                turn_count,
                usize::MAX,
                usize::MAX,
                FULL_PROFILE_VALUE_CHARS,
            ),
            ContextStyle::Condensed => (
                settings.condensed_recent_turns,
                settings.condensed_answer_chars,
                settings.condensed_profile_entries,
                CONDENSED_PROFILE_VALUE_CHARS,
            ),
        };

        let start = turn_count.saturating_sub(keep);
        let recent_turns = state.turns[start..]
            .iter()
            .map(|turn| {
                (
                    turn.question.clone(),
                    truncate_chars(turn.answer.trim(), answer_chars),
                )
            })
            .collect();

        let mut covered_categories: Vec<String> = Vec::new();
        for turn in &state.turns[..start] {
            if !covered_categories.contains(&turn.category) {
                covered_categories.push(turn.category.clone());
            }
        }

        let profile_summary = state
            .profile
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .take(profile_entries)
            .map(|(category, value)| format!("{category}: {}", value.summary(value_chars)))
            .collect();

        Self {
            style,
            query: state.query.clone(),
            mode: state.mode,
            target: gaps.first().cloned(),
            open_gaps: gaps
                .iter()
                .take(LISTED_GAPS)
                .map(|gap| gap.category.clone())
                .collect(),
            recent_turns,
            omitted_turns: start,
            covered_categories,
            profile_summary,
        }
    }

    /// Renders the prompt sent to the proposer.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "The user asked: \"{}\"", self.query);
        let _ = writeln!(out, "Interview style: {}", self.mode.probing_style());

        if !self.profile_summary.is_empty() {
            out.push_str("\nKnown so far:\n");
            for line in &self.profile_summary {
                let _ = writeln!(out, "- {line}");
            }
        }

        if self.omitted_turns > 0 {
            let _ = writeln!(
                out,
                "\n{} earlier question(s) omitted; topics already covered: {}.",
                self.omitted_turns,
                self.covered_categories.join(", ")
            );
        }
        if !self.recent_turns.is_empty() {
            out.push_str(match self.style {
                ContextStyle::Full => "\nConversation so far:\n",
                ContextStyle::Condensed => "\nMost recent exchange:\n",
            });
            for (question, answer) in &self.recent_turns {
                let _ = writeln!(out, "Q: {question}\nA: {answer}");
            }
        }

        if !self.open_gaps.is_empty() {
            let _ = writeln!(out, "\nStill missing: {}.", self.open_gaps.join(", "));
        }
        match &self.target {
            Some(gap) => {
                let _ = writeln!(
                    out,
                    "Ask one new question about the user's {} ({}). Do not repeat earlier questions.",
                    gap.category.replace('_', " "),
                    gap.priority
                );
            }
            None => {
                out.push_str(
                    "Ask one new question that would most improve personalization. Do not repeat earlier questions.\n",
                );
            }
        }
        out
    }
}

/// Prompt asking the proposer to rate the opening query.
pub fn signal_prompt(query: &str) -> String {
    format!(
        "Rate this request on three scales from 0.0 to 1.0 and reply with JSON only, \
         e.g. {{\"urgency\": 0.2, \"complexity\": 0.7, \"engagement\": 0.5}}.\n\
         urgency: how time-pressed the user seems.\n\
         complexity: how much nuance the research needs.\n\
         engagement: how much detail the user volunteers.\n\
         Request: \"{query}\""
    )
}
