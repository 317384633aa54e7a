use chrono::Utc;
use researchintake::analysis::{
    DuplicateFilter, EngagementSignals, Recommendation, IMPORTANT_CATEGORIES,
};
use researchintake::interview::{
    ConversationState, InterviewMode, ProfileValue, QuestionType, Score, Turn, TurnUpdate,
};
use researchintake::orchestration::{ModeController, QuestionSource};
use researchintake::proposers::{OfflineProposer, ProposerError};

use crate::support::{FailingProposer, LAPTOP_QUERY};
use crate::IntegrationHarness;

fn record_turn(state: &mut ConversationState, question: &str, answer: &str) {
    state.apply_turn(TurnUpdate {
        turn: Turn {
            question: question.to_string(),
            answer: answer.to_string(),
            category: "context".into(),
            timestamp: Utc::now(),
            confidence: Score::ZERO,
            importance: Score::ONE,
            question_type: QuestionType::Exploratory,
        },
        profile_entry: None,
    });
}

#[test]
fn empty_profile_after_one_turn_continues() {
    let harness = IntegrationHarness::new();
    let orchestrator = harness.orchestrator(OfflineProposer);
    let mut state = ConversationState::new("scenario-a", LAPTOP_QUERY, InterviewMode::Standard);
    record_turn(&mut state, "Could you tell me about yourself?", "");

    let result = orchestrator.assess(&state);
    assert_eq!(result.recommendation, Recommendation::Continue);
    assert_eq!(result.missing_categories.len(), IMPORTANT_CATEGORIES.len());
}

#[test]
fn rich_profile_after_six_turns_is_sufficient() {
    let harness = IntegrationHarness::new();
    let orchestrator = harness.orchestrator(OfflineProposer);
    let mut state = ConversationState::new("scenario-b", LAPTOP_QUERY, InterviewMode::Standard);
    for category in IMPORTANT_CATEGORIES {
        state.profile.insert(
            category.to_string(),
            ProfileValue::text(format!("{category}: {}", "detail ".repeat(16))),
        );
    }
    for n in 0..6 {
        record_turn(&mut state, &format!("Question {n}?"), "A reasonably complete answer.");
    }

    let result = orchestrator.assess(&state);
    assert_eq!(result.recommendation, Recommendation::Sufficient);
    assert!(result.missing_categories.is_empty());
    assert!(result.confidence.value() >= 0.65);
    assert!(orchestrator.next_question(&state).is_none());
}

#[test]
fn impatience_in_deep_mode_steps_down_to_standard() {
    let mut state = ConversationState::new("scenario-c", LAPTOP_QUERY, InterviewMode::Deep);
    record_turn(&mut state, "What do you do?", "I write software");
    record_turn(&mut state, "What matters most?", "Speed");
    let signals = EngagementSignals {
        impatience_indicators: vec!["quick".into()],
        ..EngagementSignals::default()
    };

    let outcome = ModeController::default()
        .update(&mut state, &signals)
        .expect("transition expected");
    assert_eq!(outcome.transition.from, InterviewMode::Deep);
    assert_eq!(outcome.transition.to, InterviewMode::Standard);
    assert!(outcome.max_questions < InterviewMode::Deep.max_questions());
    assert_eq!(state.mode, InterviewMode::Standard);
    assert_eq!(state.max_turns, outcome.max_questions);
}

#[test]
fn related_question_is_a_duplicate_in_strict_mode() {
    let filter = DuplicateFilter::default();
    assert!(filter.is_duplicate(
        "What features are most important to you?",
        &["What matters most in your choice?"],
        1,
    ));
}

#[test]
fn failing_proposer_still_yields_a_question() {
    let harness = IntegrationHarness::new();
    let proposer = FailingProposer::new(ProposerError::Transient("503".into()));
    let orchestrator = harness.orchestrator(proposer.clone());
    let state = orchestrator.initialize(LAPTOP_QUERY, "scenario-e");

    let first = orchestrator.next_question(&state).expect("fallback question");
    assert!(!first.text.trim().is_empty());
    assert_eq!(first.source, QuestionSource::Template);
    assert_eq!(first.question_type, QuestionType::Template);

    let second = orchestrator.next_question(&state).expect("fallback question");
    assert_eq!(first, second, "fallback selection is deterministic");
    assert_eq!(proposer.calls(), 6);
}
