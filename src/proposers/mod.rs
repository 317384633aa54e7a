//! External question proposers.
//!
//! The proposer is the only network-bound collaborator of the interview loop.
//! It is called synchronously and is expected to fail now and then; the
//! orchestrator owns retries and fallbacks.

pub mod http;
pub mod offline;

pub use http::{HttpProposer, HttpProposerConfig};
pub use offline::OfflineProposer;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposerError {
    #[error("proposer timed out")]
    Timeout,

    /// 5xx, rate limiting, dropped connections.
    #[error("transient proposer failure: {0}")]
    Transient(String),

    /// Misconfiguration or a hard client error; retrying will not help.
    #[error("proposer unavailable: {0}")]
    Unavailable(String),

    #[error("malformed proposer output: {0}")]
    Malformed(String),
}

impl ProposerError {
    /// Whether the failure is worth a backoff and another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProposerError::Timeout | ProposerError::Transient(_))
    }
}

/// Suggests text (usually a single question) for a rendered prompt.
pub trait TextProposer {
    fn name(&self) -> &str;

    fn propose(&self, prompt: &str) -> Result<String, ProposerError>;
}

impl<T: TextProposer + ?Sized> TextProposer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn propose(&self, prompt: &str) -> Result<String, ProposerError> {
        (**self).propose(prompt)
    }
}
