//! Keyword heuristics for query urgency/complexity and answer engagement.

use serde::{Deserialize, Serialize};

use crate::interview::ConversationState;

const URGENCY_WORDS: &[&str] = &[
    "urgent", "asap", "quick", "quickly", "fast", "soon", "today", "tonight", "hurry",
    "immediately", "now", "deadline",
];

const COMPLEXITY_WORDS: &[&str] = &[
    "compare", "comparison", "comprehensive", "detailed", "in-depth", "analysis", "analyze",
    "strategy", "research", "long-term", "multiple", "tradeoffs", "trade-offs", "versus", "vs",
    "pros", "cons", "evaluate",
];

const PERSONAL_WORDS: &[&str] = &["i", "i'm", "my", "me", "we", "our", "i've", "myself"];

const IMPATIENCE_PHRASES: &[&str] = &[
    "quick", "hurry", "faster", "just give", "skip", "enough questions", "get on with",
    "let's move on", "move on", "short on time", "no time", "too many questions",
];

const DETAIL_PHRASES: &[&str] = &[
    "more detail", "more details", "tell me more", "elaborate", "in depth", "in-depth",
    "explain", "go deeper", "dig deeper", "more thorough",
];

const LENGTH_TREND_WINDOW: usize = 3;
const IMPATIENCE_WINDOW: usize = 2;

/// Signal bundle computed once from the opening query; each value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuerySignals {
    pub urgency: f64,
    pub complexity: f64,
    pub engagement: f64,
}

impl QuerySignals {
    /// Keyword fallback used whenever the proposer cannot help.
    pub fn from_query(query: &str) -> Self {
        let tokens = tokenize(query);
        let hits = |words: &[&str]| tokens.iter().filter(|t| words.contains(&t.as_str())).count();

        let urgency = (hits(URGENCY_WORDS) as f64 * 0.35).min(1.0);
        let mut complexity = hits(COMPLEXITY_WORDS) as f64 * 0.3;
        if tokens.len() > 20 {
            complexity += 0.2;
        }
        let mut engagement = 0.2 + (tokens.len() as f64 / 40.0).min(0.4);
        if hits(PERSONAL_WORDS) > 0 {
            engagement += 0.2;
        }
        if query.contains('?') {
            engagement += 0.1;
        }
        Self {
            urgency,
            complexity: complexity.min(1.0),
            engagement: engagement.min(1.0),
        }
    }

    /// Parses a proposer reply of the form
    /// `{"urgency": 0.2, "complexity": 0.8, "engagement": 0.5}`, tolerating
    /// surrounding prose. Returns `None` for anything malformed or out of range.
    pub fn from_proposer_reply(reply: &str) -> Option<Self> {
        let start = reply.find('{')?;
        let end = reply.rfind('}')?;
        if end <= start {
            return None;
        }
        let parsed: QuerySignals = serde_json::from_str(&reply[start..=end]).ok()?;
        let in_range = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        (in_range(parsed.urgency) && in_range(parsed.complexity) && in_range(parsed.engagement))
            .then_some(parsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthTrend {
    Increasing,
    Decreasing,
    Stable,
}

/// Observed engagement, recomputed after every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSignals {
    pub impatience_indicators: Vec<String>,
    pub detail_requests: usize,
    pub response_length_trend: LengthTrend,
}

impl Default for EngagementSignals {
    fn default() -> Self {
        Self {
            impatience_indicators: Vec::new(),
            detail_requests: 0,
            response_length_trend: LengthTrend::Stable,
        }
    }
}

impl EngagementSignals {
    /// Signals from answers given since the latest mode change. Answers that
    /// already caused a transition are spent and never trigger another one.
    pub fn from_state(state: &ConversationState) -> Self {
        let spent = state
            .mode_transitions
            .last()
            .map(|transition| transition.at_turn)
            .unwrap_or(0);
        let answers: Vec<&str> = state.answers().skip(spent).collect();
        Self::from_answers(&answers)
    }

    pub fn from_answers(answers: &[&str]) -> Self {
        let recent_start = answers.len().saturating_sub(IMPATIENCE_WINDOW);
        let mut impatience_indicators = Vec::new();
        for answer in &answers[recent_start..] {
            let lowered = answer.to_lowercase();
            for phrase in IMPATIENCE_PHRASES {
                if contains_phrase(&lowered, phrase)
                    && !impatience_indicators.iter().any(|seen: &String| seen.as_str() == *phrase)
                {
                    impatience_indicators.push(phrase.to_string());
                }
            }
        }

        let detail_requests = answers
            .iter()
            .map(|answer| {
                let lowered = answer.to_lowercase();
                DETAIL_PHRASES
                    .iter()
                    .filter(|phrase| contains_phrase(&lowered, phrase))
                    .count()
                    .min(1)
            })
            .sum();

        Self {
            impatience_indicators,
            detail_requests,
            response_length_trend: length_trend(answers),
        }
    }
}

/// Trend over the last three answers: strictly monotonic or stable.
pub fn length_trend(answers: &[&str]) -> LengthTrend {
    if answers.len() < LENGTH_TREND_WINDOW {
        return LengthTrend::Stable;
    }
    let lengths: Vec<usize> = answers[answers.len() - LENGTH_TREND_WINDOW..]
        .iter()
        .map(|answer| answer.trim().chars().count())
        .collect();
    if lengths.windows(2).all(|pair| pair[1] > pair[0]) {
        LengthTrend::Increasing
    } else if lengths.windows(2).all(|pair| pair[1] < pair[0]) {
        LengthTrend::Decreasing
    } else {
        LengthTrend::Stable
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let padded = format!(" {} ", tokenize(haystack).join(" "));
    padded.contains(&format!(" {} ", tokenize(phrase).join(" ")))
}
