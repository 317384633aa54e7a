//! User-facing prompt boundary.

pub mod console;

pub use console::ConsolePrompt;

use anyhow::Result;

/// What the user did at a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserReply {
    Answer(String),
    Cancelled,
}

/// Asks the user a question and waits for the reply.
pub trait UserPrompt {
    fn ask(&mut self, question: &str) -> Result<UserReply>;

    /// Informational message (mode changes, ending early).
    fn notify(&mut self, message: &str) -> Result<()>;
}
