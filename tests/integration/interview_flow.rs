use std::collections::BTreeSet;

use anyhow::Result;
use researchintake::analysis::{DuplicateFilter, Recommendation};
use researchintake::interview::{
    ConversationState, InterviewMode, QuestionType, TransitionTrigger,
};
use researchintake::orchestration::{
    templates_for, InterviewContext, PlannedQuestion, QuestionSource, StopReason,
    ENDING_EARLY_NOTICE,
};
use researchintake::proposers::OfflineProposer;
use researchintake::storage::{InterviewEventType, InterviewLog};

use crate::support::{NeverSimilar, ScriptedPrompt, ScriptedProposer, DETAILED_ANSWERS, LAPTOP_QUERY};
use crate::IntegrationHarness;

#[test]
fn offline_interview_stops_once_profile_is_sufficient() -> Result<()> {
    let harness = IntegrationHarness::new();
    let orchestrator = harness.orchestrator(OfflineProposer);
    let mut state = orchestrator.initialize(LAPTOP_QUERY, "offline-run");
    assert_eq!(state.mode, InterviewMode::Standard);
    assert_eq!(
        state.information_gaps,
        vec!["context", "use_case", "budget", "preferences"]
    );

    let mut prompt = ScriptedPrompt::new(DETAILED_ANSWERS);
    let outcome = orchestrator.run(&mut state, &mut prompt, &InterviewContext::new())?;

    assert_eq!(outcome.stop_reason, StopReason::Sufficient);
    assert_eq!(outcome.turns_asked, 3);
    assert_eq!(outcome.assessment.recommendation, Recommendation::Sufficient);
    let expected: Vec<String> = ["context", "use_case", "budget"]
        .iter()
        .map(|category| templates_for(category).expect("known category")[0].to_string())
        .collect();
    assert_eq!(prompt.asked, expected);
    assert!(prompt.notices.is_empty());
    assert_eq!(state.information_gaps, vec!["preferences"]);
    assert!(state.completion_confidence.value() >= 0.65);

    let saved = harness.store().load("offline-run")?.expect("session saved");
    assert_eq!(saved, state);

    let store = harness.store();
    let events = InterviewLog::for_session(store.root(), "offline-run")?.read_all()?;
    assert_eq!(
        events.first().map(|e| e.event_type),
        Some(InterviewEventType::SessionStarted)
    );
    assert_eq!(
        events.last().map(|e| e.event_type),
        Some(InterviewEventType::InterviewCompleted)
    );
    let asked = events
        .iter()
        .filter(|e| e.event_type == InterviewEventType::QuestionAsked)
        .count();
    assert_eq!(asked, 3);
    Ok(())
}

#[test]
fn hard_turn_cap_ends_interview() -> Result<()> {
    let mut harness = IntegrationHarness::new();
    harness.config.interview.hard_turn_cap = 4;
    let proposer = ScriptedProposer::questions(&[
        "Which laptop brands have you owned before?",
        "How heavy a machine are you willing to carry?",
        "Do you need a dedicated graphics card?",
        "What screen size feels comfortable to you?",
        "Is battery life more important than raw speed?",
    ]);
    let orchestrator = harness
        .orchestrator(proposer.clone())
        .with_duplicate_filter(DuplicateFilter::new(Box::new(NeverSimilar)));
    let mut state = orchestrator.initialize(LAPTOP_QUERY, "capped");
    assert_eq!(state.max_turns, 4);

    let mut prompt = ScriptedPrompt::new(vec!["not sure"; 10]);
    let outcome = orchestrator.run(&mut state, &mut prompt, &InterviewContext::new())?;

    assert_eq!(outcome.stop_reason, StopReason::TurnCap);
    assert_eq!(state.turn_count(), 4);
    assert_eq!(proposer.calls(), 4);
    assert_eq!(outcome.assessment.recommendation, Recommendation::Sufficient);
    assert!(outcome.assessment.confidence.value() < 0.65);
    Ok(())
}

#[test]
fn mode_change_is_announced_once_per_trigger() -> Result<()> {
    let harness = IntegrationHarness::new();
    let orchestrator = harness.orchestrator(OfflineProposer);
    let mut state =
        orchestrator.initialize("Compare detailed research analysis of cameras", "impatient");
    assert_eq!(state.mode, InterviewMode::Deep);
    assert_eq!(state.max_turns, 12);

    let mut prompt = ScriptedPrompt::new([
        "I am a hobbyist photographer who shoots landscapes on weekends and wants better low light performance from my gear",
        "Please be quick about it",
        "No that covers it",
    ]);
    let outcome = orchestrator.run(&mut state, &mut prompt, &InterviewContext::new())?;

    assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    assert_eq!(prompt.asked.len(), 4);
    assert_eq!(state.turn_count(), 3);
    assert_eq!(state.mode, InterviewMode::Standard);
    assert_eq!(state.max_turns, 7);
    assert_eq!(state.mode_transitions.len(), 1);
    assert!(state.mode_transitions[0].notified);
    assert_eq!(outcome.notices, prompt.notices);
    assert_eq!(outcome.notices.len(), 1);
    assert!(outcome.notices[0].contains("standard"));
    Ok(())
}

fn answer_in_sequence(
    mode: InterviewMode,
    answers: &[&str],
) -> Result<Vec<(InterviewMode, InterviewMode, TransitionTrigger, usize)>> {
    let harness = IntegrationHarness::new();
    let orchestrator = harness.orchestrator(OfflineProposer);
    let mut state = ConversationState::new("sequence", LAPTOP_QUERY, mode);
    for (n, answer) in answers.iter().enumerate() {
        let question = PlannedQuestion {
            text: format!("Question number {n}?"),
            category: "context".into(),
            question_type: QuestionType::Template,
            source: QuestionSource::Template,
        };
        orchestrator.process_response(&mut state, &question, answer)?;
    }
    Ok(state
        .mode_transitions
        .iter()
        .map(|t| (t.from, t.to, t.trigger, t.at_turn))
        .collect())
}

#[test]
fn single_impatient_answer_steps_down_one_level() -> Result<()> {
    let transitions = answer_in_sequence(
        InterviewMode::Deep,
        &[
            "I write software for a living",
            "mostly web work on the road",
            "can we hurry",
            "it is fine I guess honestly",
        ],
    )?;
    assert_eq!(
        transitions,
        vec![(
            InterviewMode::Deep,
            InterviewMode::Standard,
            TransitionTrigger::Impatience,
            3
        )]
    );
    Ok(())
}

#[test]
fn earlier_detail_requests_do_not_undo_later_impatience() -> Result<()> {
    let transitions = answer_in_sequence(
        InterviewMode::Standard,
        &[
            "tell me more",
            "more detail please",
            "ok sure",
            "hurry",
            "fine ok",
            "sure thing ok",
            "alright then ok",
        ],
    )?;
    assert_eq!(
        transitions,
        vec![
            (
                InterviewMode::Standard,
                InterviewMode::Deep,
                TransitionTrigger::DetailRequests,
                2
            ),
            (
                InterviewMode::Deep,
                InterviewMode::Standard,
                TransitionTrigger::Impatience,
                4
            ),
        ]
    );
    Ok(())
}

#[test]
fn exhausted_templates_end_the_interview_early() -> Result<()> {
    let harness = IntegrationHarness::new();
    let orchestrator = harness.orchestrator(OfflineProposer);
    let mut state = orchestrator.initialize("Find a laptop", "exhausted");
    assert_eq!(state.information_gaps, vec!["context", "preferences"]);

    let mut prompt = ScriptedPrompt::new(vec!["not sure"; 10]);
    let outcome = orchestrator.run(&mut state, &mut prompt, &InterviewContext::new())?;

    assert_eq!(outcome.stop_reason, StopReason::FallbacksExhausted);
    assert_eq!(state.turn_count(), 4);
    assert_eq!(prompt.notices, vec![ENDING_EARLY_NOTICE.to_string()]);
    let distinct: BTreeSet<&String> = prompt.asked.iter().collect();
    assert_eq!(distinct.len(), 4, "no question repeated: {:?}", prompt.asked);
    Ok(())
}

#[test]
fn cancellation_leaves_the_pending_turn_unrecorded() -> Result<()> {
    let harness = IntegrationHarness::new();
    let orchestrator = harness.orchestrator(OfflineProposer);
    let mut state = orchestrator.initialize(LAPTOP_QUERY, "cancelled");
    let ctx = InterviewContext::new();

    let mut prompt = ScriptedPrompt::new(DETAILED_ANSWERS).cancel_on_ask(2, ctx.token());
    let outcome = orchestrator.run(&mut state, &mut prompt, &ctx)?;

    assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    assert_eq!(prompt.asked.len(), 2);
    assert_eq!(state.turn_count(), 1);
    assert!(state.has_category("context"));
    assert!(!state.has_category("use_case"));

    let saved = harness.store().load("cancelled")?.expect("session saved");
    assert_eq!(saved.turn_count(), 1);
    Ok(())
}

#[test]
fn cancelled_context_asks_nothing() -> Result<()> {
    let harness = IntegrationHarness::new();
    let orchestrator = harness.orchestrator(OfflineProposer);
    let mut state = orchestrator.initialize(LAPTOP_QUERY, "pre-cancelled");
    let ctx = InterviewContext::new();
    ctx.token().cancel();

    let mut prompt = ScriptedPrompt::new(DETAILED_ANSWERS);
    let outcome = orchestrator.run(&mut state, &mut prompt, &ctx)?;

    assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    assert!(prompt.asked.is_empty());
    assert_eq!(outcome.turns_asked, 0);
    Ok(())
}

#[test]
fn proposer_questions_are_used_and_typed() -> Result<()> {
    let harness = IntegrationHarness::new();
    let proposer = ScriptedProposer::questions(&["Sure! Here is one:\n1. \"What does a typical workday look like for you?\""]);
    let orchestrator = harness.orchestrator(proposer.clone());
    let state = orchestrator.initialize(LAPTOP_QUERY, "proposed");

    let question = orchestrator.next_question(&state).expect("interview not complete");
    assert_eq!(question.text, "What does a typical workday look like for you?");
    assert_eq!(question.category, "context");
    assert_eq!(
        question.question_type,
        researchintake::interview::QuestionType::Exploratory
    );
    let prompts = proposer.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(LAPTOP_QUERY));
    Ok(())
}
