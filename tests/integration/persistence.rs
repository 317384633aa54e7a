use std::fs;

use anyhow::Result;
use researchintake::orchestration::{templates_for, InterviewContext, StopReason};
use researchintake::proposers::OfflineProposer;
use researchintake::workspace::load_from;

use crate::support::{ScriptedPrompt, DETAILED_ANSWERS, LAPTOP_QUERY};
use crate::IntegrationHarness;

#[test]
fn cancelled_interview_resumes_where_it_stopped() -> Result<()> {
    let harness = IntegrationHarness::new();
    let orchestrator = harness.orchestrator(OfflineProposer);
    let mut state = orchestrator.initialize(LAPTOP_QUERY, "resumable");

    let mut first = ScriptedPrompt::new([DETAILED_ANSWERS[0]]);
    let outcome = orchestrator.run(&mut state, &mut first, &InterviewContext::new())?;
    assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    assert_eq!(state.turn_count(), 1);

    let mut resumed = harness.store().load("resumable")?.expect("saved session");
    assert_eq!(resumed, state);

    let orchestrator = harness.orchestrator(OfflineProposer);
    let mut second = ScriptedPrompt::new(DETAILED_ANSWERS[1..].iter().copied());
    let outcome = orchestrator.run(&mut resumed, &mut second, &InterviewContext::new())?;
    assert_eq!(outcome.stop_reason, StopReason::Sufficient);
    assert_eq!(outcome.turns_asked, 2);
    assert_eq!(resumed.turn_count(), 3);
    assert_eq!(
        second.asked,
        vec![
            templates_for("use_case").expect("use_case")[0].to_string(),
            templates_for("budget").expect("budget")[0].to_string(),
        ]
    );
    Ok(())
}

#[test]
fn sessions_are_listed_newest_first() -> Result<()> {
    let harness = IntegrationHarness::new();
    let orchestrator = harness.orchestrator(OfflineProposer);
    let older = orchestrator.initialize("Find a laptop", "older");
    let mut newer = orchestrator.initialize(LAPTOP_QUERY, "newer");
    let mut prompt = ScriptedPrompt::new([DETAILED_ANSWERS[0]]);
    orchestrator.run(&mut newer, &mut prompt, &InterviewContext::new())?;
    assert!(newer.updated_at >= older.updated_at);

    let store = harness.store();
    store.save(&older)?;
    store.save(&newer)?;
    fs::write(store.root().join("broken.json"), "{ not json")?;

    let listed = store.list()?;
    let ids: Vec<&str> = listed.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec!["newer", "older"]);
    assert_eq!(listed[0].turns, 1);
    assert!(store.load("missing")?.is_none());
    Ok(())
}

#[test]
fn config_file_overrides_turn_cap() -> Result<()> {
    let mut harness = IntegrationHarness::new();
    let path = harness.workspace_path().join("config.toml");
    fs::write(&path, "[interview]\nhard_turn_cap = 2\n")?;
    harness.config = load_from(&path)?;
    assert_eq!(harness.config.interview.hard_turn_cap, 2);

    let orchestrator = harness.orchestrator(OfflineProposer);
    let mut state = orchestrator.initialize(LAPTOP_QUERY, "from-config");
    assert_eq!(state.max_turns, 2);

    let mut prompt = ScriptedPrompt::new(vec!["not sure"; 5]);
    let outcome = orchestrator.run(&mut state, &mut prompt, &InterviewContext::new())?;
    assert_eq!(outcome.stop_reason, StopReason::TurnCap);
    assert_eq!(state.turn_count(), 2);
    Ok(())
}
