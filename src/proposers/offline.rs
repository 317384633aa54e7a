use super::{ProposerError, TextProposer};

/// Proposer used when no endpoint is configured. Every call fails, so the
/// interview runs entirely on gap-driven templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProposer;

impl TextProposer for OfflineProposer {
    fn name(&self) -> &str {
        "offline"
    }

    fn propose(&self, _prompt: &str) -> Result<String, ProposerError> {
        Err(ProposerError::Unavailable(
            "no proposer endpoint configured".into(),
        ))
    }
}
