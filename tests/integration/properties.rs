use chrono::Utc;
use proptest::prelude::*;
use researchintake::analysis::{
    CompletionAssessor, DuplicateFilter, GapAnalyzer, Recommendation, IMPORTANT_CATEGORIES,
};
use researchintake::interview::{
    ConversationState, InterviewMode, ProfileValue, QuestionType, Score, Turn, TurnUpdate,
};

fn state_with(
    mode: InterviewMode,
    filled: &[(usize, usize)],
    answers: &[String],
) -> ConversationState {
    let mut state = ConversationState::new("prop", "Recommend a laptop for work within budget", mode);
    for (index, length) in filled {
        let category = IMPORTANT_CATEGORIES[index % IMPORTANT_CATEGORIES.len()];
        state
            .profile
            .insert(category.to_string(), ProfileValue::text("x".repeat(*length)));
    }
    for (n, answer) in answers.iter().enumerate() {
        state.apply_turn(TurnUpdate {
            turn: Turn {
                question: format!("Question {n}?"),
                answer: answer.clone(),
                category: "context".into(),
                timestamp: Utc::now(),
                confidence: Score::saturating(0.5),
                importance: Score::ONE,
                question_type: QuestionType::Template,
            },
            profile_entry: None,
        });
    }
    state
}

fn mode_strategy() -> impl Strategy<Value = InterviewMode> {
    prop::sample::select(InterviewMode::ALL.to_vec())
}

proptest! {
    #[test]
    fn completion_confidence_stays_in_unit_range(
        mode in mode_strategy(),
        filled in prop::collection::vec((0usize..8, 0usize..400), 0..10),
        answers in prop::collection::vec("[a-z ]{0,40}", 0..16),
    ) {
        let state = state_with(mode, &filled, &answers);
        let gaps = GapAnalyzer::keyword(7).identify_gaps(&state.query, &state.profile);
        let result = CompletionAssessor::default().assess(&state, &gaps);
        prop_assert!((0.0..=1.0).contains(&result.confidence.value()));
        if state.turn_count() >= state.max_turns {
            prop_assert_eq!(result.recommendation, Recommendation::Sufficient);
        }
    }

    #[test]
    fn verbatim_repeat_is_always_a_duplicate(
        candidate in "[A-Za-z]{1,10}( [a-z]{1,10}){0,6}\\?",
        turn_count in 0usize..20,
    ) {
        let filter = DuplicateFilter::default();
        prop_assert!(filter.is_duplicate(&candidate, &[candidate.as_str()], turn_count));
    }

    #[test]
    fn state_survives_json_round_trip(
        mode in mode_strategy(),
        filled in prop::collection::vec((0usize..8, 1usize..50), 0..8),
        answers in prop::collection::vec("[a-zA-Z ,.]{0,30}", 0..6),
    ) {
        let state = state_with(mode, &filled, &answers);
        let json = state.to_json().expect("serialize");
        let restored = ConversationState::from_json(&json).expect("deserialize");
        prop_assert_eq!(restored, state);
    }

    #[test]
    fn merging_text_keeps_both_values(a in "[a-z]{1,12}", b in "[a-z]{1,12}") {
        let merged = ProfileValue::text(a.clone()).merge(ProfileValue::text(b.clone()));
        let rendered = merged.summary(usize::MAX);
        prop_assert!(rendered.contains(&a));
        prop_assert!(rendered.contains(&b));
    }
}
