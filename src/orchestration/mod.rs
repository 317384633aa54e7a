//! Interview turn loop and the pieces it is assembled from.

pub mod cancel;
pub mod context;
pub mod extraction;
pub mod mode;
pub mod orchestrator;
pub mod retry;
pub mod templates;

pub use cancel::{CancellationToken, InterviewContext};
pub use context::{signal_prompt, ContextStyle, ContextWindow};
pub use extraction::{answer_confidence, extract, ExtractedAnswer};
pub use mode::{next_mode, step_down, step_up, ModeController, TransitionOutcome};
pub use orchestrator::{
    parse_candidate, InterviewOutcome, Orchestrator, PlannedQuestion, QuestionSource,
    ResponseOutcome, StopReason,
};
pub use retry::{NoopSleeper, RetryPolicy, Sleeper, ThreadSleeper};
pub use templates::{
    fallback_question, templates_for, TemplateQuestion, ENDING_EARLY_NOTICE, EXHAUSTED_QUESTION,
};
