//! Session persistence and event logging.

pub mod events;
pub mod sessions;

pub use events::{InterviewEvent, InterviewEventType, InterviewLog};
pub use sessions::{
    compute_hash, validate_session_id, SessionStore, SessionWriteOutcome, StoredSession,
};
