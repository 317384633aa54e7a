//! Conversation data model shared by the analysis and orchestration layers.

pub mod error;
pub mod score;
pub mod state;
pub mod value;

pub use error::StateError;
pub use score::Score;
pub use state::{
    ConversationState, InterviewMode, ModeTransition, QuestionType, TransitionTrigger, Turn,
    TurnUpdate,
};
pub use value::{truncate_chars, ProfileValue};
