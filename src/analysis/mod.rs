//! Scoring and heuristics over a [`ConversationState`](crate::interview::ConversationState).

pub mod completion;
pub mod dedup;
pub mod gaps;
pub mod signals;

pub use completion::{
    progress_for_turns, AssessmentError, CompletionAssessor, CompletionResult, Recommendation,
    ScoreBreakdown,
};
pub use dedup::{DuplicateFilter, KeywordOverlapStrategy, SemanticBucket, SimilarityStrategy};
pub use gaps::{
    category_priority, DomainClassifier, Gap, GapAnalyzer, GapPriority, KeywordDomainClassifier,
    IMPORTANT_CATEGORIES,
};
pub use signals::{EngagementSignals, LengthTrend, QuerySignals};
