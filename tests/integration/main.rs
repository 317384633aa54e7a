mod interview_flow;
mod persistence;
mod properties;
mod scenarios;
mod support;

use std::path::Path;

use researchintake::proposers::TextProposer;
use researchintake::storage::SessionStore;
use researchintake::workspace::AppConfig;
use researchintake::Orchestrator;
use tempfile::TempDir;

use support::RecordingSleeper;

/// Temp workspace plus an orchestrator wired to it.
pub struct IntegrationHarness {
    workspace: TempDir,
    pub config: AppConfig,
    pub sleeper: RecordingSleeper,
}

impl IntegrationHarness {
    pub fn new() -> Self {
        let workspace = TempDir::new().expect("failed to create temp workspace");
        Self {
            workspace,
            config: AppConfig::default(),
            sleeper: RecordingSleeper::default(),
        }
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    pub fn store(&self) -> SessionStore {
        SessionStore::new(self.workspace.path().join("sessions"))
    }

    /// Orchestrator that skips proposer query rating and never really sleeps.
    pub fn orchestrator(&self, proposer: impl TextProposer + 'static) -> Orchestrator {
        Orchestrator::new(&self.config, Box::new(proposer))
            .with_sleeper(Box::new(self.sleeper.clone()))
            .with_store(self.store())
            .without_proposer_signals()
    }
}
