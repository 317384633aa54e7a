//! Append-only JSONL event log per interview session.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sessions::validate_session_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewEventType {
    SessionStarted,
    QuestionAsked,
    ResponseRecorded,
    ModeChanged,
    InterviewCompleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewEvent {
    pub event_id: Uuid,
    pub session_id: String,
    pub event_type: InterviewEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl InterviewEvent {
    pub fn new(
        session_id: impl Into<String>,
        event_type: InterviewEventType,
        details: serde_json::Value,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            session_id: session_id.into(),
            event_type,
            timestamp: Utc::now(),
            details,
        }
    }
}

/// Wraps the `<session_id>.events.jsonl` path next to the session file.
pub struct InterviewLog {
    events_path: PathBuf,
}

impl InterviewLog {
    pub fn for_session(root: &Path, session_id: &str) -> Result<Self> {
        validate_session_id(session_id)?;
        Ok(Self {
            events_path: root.join(format!("{session_id}.events.jsonl")),
        })
    }

    pub fn path(&self) -> &Path {
        &self.events_path
    }

    pub fn append(&self, event: &InterviewEvent) -> Result<()> {
        if let Some(parent) = self.events_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)
            .with_context(|| format!("Failed opening event log {:?}", self.events_path))?;
        file.write_all(serde_json::to_string(event)?.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<InterviewEvent>> {
        if !self.events_path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.events_path)
            .with_context(|| format!("Failed reading event log {:?}", self.events_path))?;
        data.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).context("Failed parsing event log entry"))
            .collect()
    }
}
