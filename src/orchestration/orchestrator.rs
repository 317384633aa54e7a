//! Turn loop tying gap analysis, proposer, dedup, scoring, and mode control
//! together.
//!
//! One conversation is processed strictly turn by turn. `next_question` only
//! reads the state; `process_response` validates everything before touching
//! it, so a turn either lands completely or not at all.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, info_span, warn};

use super::cancel::InterviewContext;
use super::context::{signal_prompt, ContextWindow};
use super::extraction::extract;
use super::mode::{ModeController, TransitionOutcome};
use super::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use super::templates::{fallback_question, ENDING_EARLY_NOTICE};
use crate::analysis::{
    category_priority, CompletionAssessor, CompletionResult, DuplicateFilter, EngagementSignals,
    Gap, GapAnalyzer, QuerySignals,
};
use crate::chat::{UserPrompt, UserReply};
use crate::interview::{
    ConversationState, ProfileValue, QuestionType, Score, StateError, Turn, TurnUpdate,
};
use crate::proposers::{ProposerError, TextProposer};
use crate::storage::{InterviewEvent, InterviewEventType, InterviewLog, SessionStore};
use crate::workspace::{AppConfig, InterviewSettings};

const MIN_QUESTION_CHARS: usize = 8;
const MAX_QUESTION_CHARS: usize = 300;
const ANSWER_PREVIEW_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    Proposer,
    Template,
    /// Every template was used; the loop should end the interview.
    Exhausted,
}

/// A question ready to put in front of the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedQuestion {
    pub text: String,
    pub category: String,
    pub question_type: QuestionType,
    pub source: QuestionSource,
}

#[derive(Debug, Clone)]
pub struct ResponseOutcome {
    pub extracted_info: BTreeMap<String, ProfileValue>,
    pub updated_gaps: Vec<Gap>,
    pub progress: Score,
    pub transition: Option<TransitionOutcome>,
    pub assessment: CompletionResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Sufficient,
    TurnCap,
    Cancelled,
    FallbacksExhausted,
}

#[derive(Debug, Clone)]
pub struct InterviewOutcome {
    pub stop_reason: StopReason,
    pub turns_asked: usize,
    /// Messages that were shown to the user during the run.
    pub notices: Vec<String>,
    pub assessment: CompletionResult,
}

pub struct Orchestrator {
    settings: InterviewSettings,
    proposer: Box<dyn TextProposer>,
    gaps: GapAnalyzer,
    dedup: DuplicateFilter,
    assessor: CompletionAssessor,
    modes: ModeController,
    retry: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
    slow_response: Duration,
    store: Option<SessionStore>,
    proposer_signals: bool,
}

impl Orchestrator {
    pub fn new(config: &AppConfig, proposer: Box<dyn TextProposer>) -> Self {
        Self {
            settings: config.interview.clone(),
            proposer,
            gaps: GapAnalyzer::keyword(config.interview.max_gaps),
            dedup: DuplicateFilter::with_settings(config.dedup.clone()),
            assessor: CompletionAssessor::new(config.scoring.clone()),
            modes: ModeController::new(&config.interview),
            retry: RetryPolicy::from_settings(&config.proposer),
            sleeper: Box::new(ThreadSleeper),
            slow_response: config.proposer.slow_response(),
            store: None,
            proposer_signals: true,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_gap_analyzer(mut self, gaps: GapAnalyzer) -> Self {
        self.gaps = gaps;
        self
    }

    pub fn with_duplicate_filter(mut self, dedup: DuplicateFilter) -> Self {
        self.dedup = dedup;
        self
    }

    /// Saves the state and appends events under the store root after every turn.
    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Skips asking the proposer to rate the opening query.
    pub fn without_proposer_signals(mut self) -> Self {
        self.proposer_signals = false;
        self
    }

    /// Creates the state for a new interview and picks its starting mode.
    pub fn initialize(&self, query: &str, session_id: impl Into<String>) -> ConversationState {
        let signals = self.query_signals(query);
        let mode = self.modes.select_initial(&signals);
        let mut state = ConversationState::new(session_id, query.trim(), mode);
        state.max_turns = self.modes.budget_for(mode);

        let gaps = self.gaps.identify_gaps(&state.query, &state.profile);
        state.set_information_gaps(gaps.iter().map(|gap| gap.category.clone()));
        for gap in &gaps {
            state
                .priority_factors
                .insert(gap.category.clone(), priority_score(gap));
        }
        state.completion_confidence = self.assessor.assess(&state, &gaps).confidence;

        info!(
            session_id = %state.session_id,
            mode = %mode,
            max_turns = state.max_turns,
            gaps = gaps.len(),
            "interview initialized"
        );
        self.log_event(
            &state,
            InterviewEventType::SessionStarted,
            json!({
                "query": state.query,
                "mode": mode,
                "signals": signals,
                "gaps": state.information_gaps,
            }),
        );
        state
    }

    pub fn assess(&self, state: &ConversationState) -> CompletionResult {
        let gaps = self.gaps.identify_gaps(&state.query, &state.profile);
        self.assessor.assess(state, &gaps)
    }

    /// Next question to ask, or `None` once the interview is complete.
    ///
    /// Proposer failures never surface here: after the attempt budget is spent
    /// the question comes from the gap-keyed templates.
    pub fn next_question(&self, state: &ConversationState) -> Option<PlannedQuestion> {
        let turn_count = state.turn_count();
        if turn_count >= state.max_turns.min(self.settings.hard_turn_cap) {
            return None;
        }
        let gaps = self.gaps.identify_gaps(&state.query, &state.profile);
        let assessment = self.assessor.assess(state, &gaps);
        if assessment.recommendation.should_stop() {
            debug!(session_id = %state.session_id, reasoning = %assessment.reasoning, "interview complete");
            return None;
        }

        let category = target_category(state, &gaps);
        let prompt = ContextWindow::build(state, &gaps, &self.settings).render();
        let asked = state.asked_questions();

        if let Some(text) = self.propose_unique(&prompt, &asked, turn_count) {
            let question_type = if state.has_category(&category) {
                QuestionType::FollowUp
            } else {
                QuestionType::Exploratory
            };
            return Some(PlannedQuestion {
                text,
                category,
                question_type,
                source: QuestionSource::Proposer,
            });
        }

        let template = fallback_question(&gaps, &asked);
        info!(
            session_id = %state.session_id,
            category = %template.category,
            exhausted = template.exhausted,
            "using template question"
        );
        Some(PlannedQuestion {
            text: template.text,
            category: template.category,
            question_type: QuestionType::Template,
            source: if template.exhausted {
                QuestionSource::Exhausted
            } else {
                QuestionSource::Template
            },
        })
    }

    /// Records an answer and refreshes gaps, scores, and mode.
    pub fn process_response(
        &self,
        state: &mut ConversationState,
        question: &PlannedQuestion,
        answer: &str,
    ) -> Result<ResponseOutcome, StateError> {
        let extracted = extract(answer);
        let confidence = Score::for_field("turn confidence", extracted.confidence)?;
        let importance = Score::for_field(
            "turn importance",
            category_priority(&question.category).weight(),
        )?;

        let mut extracted_info = BTreeMap::new();
        if let Some(value) = &extracted.value {
            extracted_info.insert(question.category.clone(), value.clone());
        }
        let update = TurnUpdate {
            turn: Turn {
                question: question.text.clone(),
                answer: answer.trim().to_string(),
                category: question.category.clone(),
                timestamp: chrono::Utc::now(),
                confidence,
                importance,
                question_type: question.question_type,
            },
            profile_entry: extracted
                .value
                .map(|value| (question.category.clone(), value)),
        };
        state.apply_turn(update);

        let updated_gaps = self.gaps.identify_gaps(&state.query, &state.profile);
        state.set_information_gaps(updated_gaps.iter().map(|gap| gap.category.clone()));

        let engagement = EngagementSignals::from_state(state);
        let transition = self.modes.update(state, &engagement);

        let assessment = self.assessor.assess(state, &updated_gaps);
        state.completion_confidence = assessment.confidence;

        let progress = if state.max_turns == 0 {
            Score::ONE
        } else {
            Score::saturating(state.turn_count() as f64 / state.max_turns as f64)
        };

        debug!(
            session_id = %state.session_id,
            category = %question.category,
            confidence = %confidence,
            completion = %assessment.confidence,
            "response recorded"
        );
        Ok(ResponseOutcome {
            extracted_info,
            updated_gaps,
            progress,
            transition,
            assessment,
        })
    }

    /// Drives the interview until it is complete, capped, or cancelled.
    pub fn run(
        &self,
        state: &mut ConversationState,
        prompt: &mut dyn UserPrompt,
        ctx: &InterviewContext,
    ) -> Result<InterviewOutcome> {
        let span = info_span!("interview", session_id = %state.session_id);
        let _guard = span.enter();
        let mut notices = Vec::new();
        let start_turns = state.turn_count();

        let stop_reason = loop {
            if ctx.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            let Some(question) = self.next_question(state) else {
                break if state.turn_count() >= state.max_turns.min(self.settings.hard_turn_cap) {
                    StopReason::TurnCap
                } else {
                    StopReason::Sufficient
                };
            };
            if question.source == QuestionSource::Exhausted {
                prompt.notify(ENDING_EARLY_NOTICE)?;
                notices.push(ENDING_EARLY_NOTICE.to_string());
                break StopReason::FallbacksExhausted;
            }

            self.log_event(
                state,
                InterviewEventType::QuestionAsked,
                json!({
                    "question": question.text,
                    "category": question.category,
                    "source": question.source,
                }),
            );
            let reply = prompt.ask(&question.text)?;
            let answer = match reply {
                UserReply::Answer(answer) if !ctx.cancel.is_cancelled() => answer,
                _ => break StopReason::Cancelled,
            };

            let outcome = self
                .process_response(state, &question, &answer)
                .context("Failed to record interview turn")?;
            self.log_event(
                state,
                InterviewEventType::ResponseRecorded,
                json!({
                    "category": question.category,
                    "answer_preview": crate::interview::truncate_chars(&answer, ANSWER_PREVIEW_CHARS),
                    "completion_confidence": outcome.assessment.confidence,
                    "recommendation": outcome.assessment.recommendation,
                }),
            );
            if let Some(transition) = &outcome.transition {
                self.log_event(
                    state,
                    InterviewEventType::ModeChanged,
                    json!({ "transition": transition.transition }),
                );
                if transition.notify {
                    let notice = transition.notice();
                    prompt.notify(&notice)?;
                    notices.push(notice);
                }
            }
            self.persist(state);
        };

        let assessment = self.assess(state);
        info!(
            stop_reason = ?stop_reason,
            turns = state.turn_count(),
            confidence = %assessment.confidence,
            "interview finished"
        );
        self.log_event(
            state,
            InterviewEventType::InterviewCompleted,
            json!({
                "stop_reason": stop_reason,
                "turns": state.turn_count(),
                "completion_confidence": assessment.confidence,
            }),
        );
        self.persist(state);

        Ok(InterviewOutcome {
            stop_reason,
            turns_asked: state.turn_count() - start_turns,
            notices,
            assessment,
        })
    }

    fn query_signals(&self, query: &str) -> QuerySignals {
        if self.proposer_signals {
            match self.timed_propose(&signal_prompt(query)) {
                Ok(reply) => {
                    if let Some(signals) = QuerySignals::from_proposer_reply(&reply) {
                        return signals;
                    }
                    debug!("proposer query rating unparsable; using keyword signals");
                }
                Err(err) => debug!(error = %err, "proposer query rating unavailable"),
            }
        }
        QuerySignals::from_query(query)
    }

    /// Asks the proposer for a non-duplicate question within the attempt budget.
    fn propose_unique(&self, prompt: &str, asked: &[&str], turn_count: usize) -> Option<String> {
        for attempt in 0..self.retry.max_attempts {
            match self.timed_propose(prompt).and_then(|raw| parse_candidate(&raw)) {
                Ok(candidate) => {
                    if self.dedup.is_duplicate(&candidate, asked, turn_count) {
                        debug!(attempt, candidate = %candidate, "discarding duplicate candidate");
                        continue;
                    }
                    return Some(candidate);
                }
                Err(ProposerError::Malformed(reason)) => {
                    debug!(attempt, reason = %reason, "discarding malformed proposer output");
                }
                Err(err) if err.is_transient() => {
                    let last = attempt + 1 >= self.retry.max_attempts;
                    warn!(attempt, error = %err, "transient proposer failure");
                    if !last {
                        self.sleeper.sleep(self.retry.backoff_for(attempt));
                    }
                }
                Err(err) => {
                    warn!(error = %err, proposer = self.proposer.name(), "proposer unavailable; falling back");
                    return None;
                }
            }
        }
        None
    }

    fn timed_propose(&self, prompt: &str) -> Result<String, ProposerError> {
        let started = Instant::now();
        let result = self.proposer.propose(prompt);
        let elapsed = started.elapsed();
        if elapsed > self.slow_response {
            warn!(
                proposer = self.proposer.name(),
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.slow_response.as_millis() as u64,
                "slow proposer response"
            );
        }
        result
    }

    fn persist(&self, state: &ConversationState) {
        if let Some(store) = &self.store {
            if let Err(err) = store.save(state) {
                warn!(error = %err, "failed to save session");
            }
        }
    }

    fn log_event(
        &self,
        state: &ConversationState,
        event_type: InterviewEventType,
        details: serde_json::Value,
    ) {
        if let Some(store) = &self.store {
            let event = InterviewEvent::new(state.session_id.clone(), event_type, details);
            let appended = InterviewLog::for_session(store.root(), &state.session_id)
                .and_then(|log| log.append(&event));
            if let Err(err) = appended {
                warn!(error = %err, "failed to append interview event");
            }
        }
    }
}

fn priority_score(gap: &Gap) -> Score {
    Score::saturating(gap.priority.weight())
}

/// Top gap, else the least-confident known category, else `context`.
fn target_category(state: &ConversationState, gaps: &[Gap]) -> String {
    if let Some(gap) = gaps.first() {
        return gap.category.clone();
    }
    state
        .confidence_scores
        .iter()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(category, _)| category.clone())
        .unwrap_or_else(|| "context".to_string())
}

/// Extracts a single question from raw proposer output.
pub fn parse_candidate(raw: &str) -> Result<String, ProposerError> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let line = lines
        .iter()
        .find(|line| line.contains('?'))
        .or_else(|| lines.first())
        .ok_or_else(|| ProposerError::Malformed("empty output".into()))?;

    let mut text = line.trim_start_matches(|c: char| c == '-' || c == '*' || c == '•').trim();
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 && text[digits..].starts_with(['.', ')']) {
        text = text[digits + 1..].trim();
    }
    for prefix in ["question:", "q:"] {
        if let Some(head) = text.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                text = text[prefix.len()..].trim();
            }
        }
    }
    let text = text.trim_matches(|c: char| c == '"' || c == '\'' || c == '`').trim();

    let length = text.chars().count();
    if length < MIN_QUESTION_CHARS || length > MAX_QUESTION_CHARS {
        return Err(ProposerError::Malformed(format!(
            "question length {length} outside {MIN_QUESTION_CHARS}..={MAX_QUESTION_CHARS}"
        )));
    }
    if !text.chars().any(char::is_alphabetic) {
        return Err(ProposerError::Malformed("no words in output".into()));
    }
    Ok(text.to_string())
}
