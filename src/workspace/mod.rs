//! Workspace layout and configuration.
//!
//! The workspace root holds `config/config.toml` and a `sessions/` directory
//! with one JSON file (plus one event log) per interview.

pub mod config;

pub use config::{
    load_from, load_or_default, save, save_to, AppConfig, DuplicateSettings, InterviewSettings,
    LogFormat, LoggingSettings, ProposerSettings, ScoringSettings,
};

use anyhow::{Context, Result};
use directories::BaseDirs;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Standard relative path to the config file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the workspace root.
pub const HOME_ENV: &str = "RESEARCHINTAKE_HOME";

/// Returns the root directory where ResearchIntake stores data.
///
/// Order of precedence:
/// 1. `RESEARCHINTAKE_HOME` environment variable.
/// 2. OS-specific data directory via `directories::BaseDirs`.
pub fn workspace_root() -> Result<PathBuf> {
    if let Ok(path) = env::var(HOME_ENV) {
        return Ok(PathBuf::from(path));
    }
    let base_dirs = BaseDirs::new().context("Unable to determine OS data directory")?;
    Ok(base_dirs.data_dir().join("ResearchIntake"))
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(workspace_root()?.join("config"))
}

pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

pub fn sessions_dir() -> Result<PathBuf> {
    Ok(workspace_root()?.join("sessions"))
}

/// Ensures the workspace structure exists and returns the session directory.
pub fn ensure_workspace_structure() -> Result<PathBuf> {
    let sessions = sessions_dir()?;
    fs::create_dir_all(&sessions)
        .with_context(|| format!("Failed to create sessions directory {:?}", sessions))?;
    fs::create_dir_all(config_dir()?)?;
    Ok(sessions)
}
