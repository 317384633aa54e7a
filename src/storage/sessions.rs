//! JSON persistence for conversation state.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::interview::ConversationState;

const SESSION_EXTENSION: &str = "json";

/// Result returned after writing a session file.
#[derive(Debug, Clone)]
pub struct SessionWriteOutcome {
    pub path: PathBuf,
    pub hash: String,
}

/// Listing entry for a stored session.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub session_id: String,
    pub query: String,
    pub turns: usize,
    pub updated_at: DateTime<Utc>,
}

/// Reads and writes `<root>/<session_id>.json`.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the workspace `sessions/` directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(crate::workspace::ensure_workspace_structure()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.root.join(format!("{session_id}.{SESSION_EXTENSION}")))
    }

    pub fn save(&self, state: &ConversationState) -> Result<SessionWriteOutcome> {
        let path = self.session_path(&state.session_id)?;
        let hash = write_json(&path, state)?;
        Ok(SessionWriteOutcome { path, hash })
    }

    pub fn load(&self, session_id: &str) -> Result<Option<ConversationState>> {
        read_json(&self.session_path(session_id)?)
    }

    /// All readable sessions, most recently updated first. Unparsable files
    /// are skipped.
    pub fn list(&self) -> Result<Vec<StoredSession>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut sessions = Vec::new();
        for entry in WalkDir::new(&self.root)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
        {
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(SESSION_EXTENSION)
            {
                continue;
            }
            if let Ok(Some(state)) = read_json::<ConversationState>(path) {
                sessions.push(StoredSession {
                    session_id: state.session_id,
                    query: state.query,
                    turns: state.turns.len(),
                    updated_at: state.updated_at,
                });
            }
        }
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }
}

/// Session ids name files directly under the store root, so they may not
/// contain path separators or parent references.
pub fn validate_session_id(session_id: &str) -> Result<()> {
    if session_id.trim().is_empty() {
        bail!("Session id must not be empty");
    }
    if session_id.contains(['/', '\\']) || session_id.contains("..") {
        bail!("Invalid session id '{session_id}'");
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data =
        fs::read(path).with_context(|| format!("Failed reading session file {:?}", path))?;
    let value = serde_json::from_slice(&data)
        .with_context(|| format!("Failed parsing session file {:?}", path))?;
    Ok(Some(value))
}

/// Writes pretty JSON via a temp file + rename and returns the content hash.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<String> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed creating session directory {:?}", dir))?;
    }
    let payload = serde_json::to_vec_pretty(value)
        .with_context(|| format!("Failed serializing session {:?}", path))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &payload).with_context(|| format!("Failed writing session {:?}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed replacing session {:?}", path))?;
    Ok(compute_hash(&payload))
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn compute_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
