pub mod analysis;
pub mod chat;
pub mod interview;
pub mod logging;
pub mod orchestration;
pub mod proposers;
pub mod storage;
pub mod workspace;

// Re-export commonly used types for convenience.
pub use analysis::{CompletionResult, Gap, GapPriority, Recommendation};
pub use interview::{ConversationState, InterviewMode, ProfileValue, Score};
pub use orchestration::{InterviewContext, InterviewOutcome, Orchestrator, StopReason};
pub use workspace::AppConfig;
