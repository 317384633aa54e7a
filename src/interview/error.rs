use thiserror::Error;

/// Invariant violations raised when mutating a [`ConversationState`].
///
/// These indicate programming errors in the caller, so the state refuses the
/// write instead of clamping the value.
///
/// [`ConversationState`]: super::ConversationState
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    #[error("{field} must lie in [0.0, 1.0], got {value}")]
    ScoreOutOfRange { field: String, value: f64 },

    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    #[error("unknown interview mode '{0}'")]
    UnknownMode(String),

    #[error("unknown question type '{0}'")]
    UnknownQuestionType(String),
}
