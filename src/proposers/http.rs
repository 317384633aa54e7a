//! OpenAI-compatible chat-completions proposer over blocking HTTP.

use std::env;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ProposerError, TextProposer};
use crate::workspace::ProposerSettings;

const SYSTEM_PROMPT: &str = "You help a research assistant interview its user before starting research. \
Reply with exactly one concise question and nothing else.";

#[derive(Debug, Clone)]
pub struct HttpProposerConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl HttpProposerConfig {
    /// Builds a config from settings; `None` when no endpoint is set.
    pub fn from_settings(settings: &ProposerSettings) -> Option<Self> {
        let endpoint = settings.endpoint.clone()?;
        Some(Self {
            endpoint,
            model: settings.model.clone(),
            api_key: env::var(&settings.api_key_env).ok(),
            timeout: settings.timeout(),
        })
    }
}

pub struct HttpProposer {
    client: Client,
    config: HttpProposerConfig,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HttpProposer {
    pub fn new(config: HttpProposerConfig) -> Result<Self, ProposerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProposerError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

fn classify_status(status: StatusCode, body: String) -> ProposerError {
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        ProposerError::Transient(format!("{status}: {body}"))
    } else {
        ProposerError::Unavailable(format!("{status}: {body}"))
    }
}

fn classify_transport(err: reqwest::Error) -> ProposerError {
    if err.is_timeout() {
        ProposerError::Timeout
    } else if err.is_connect() || err.is_request() {
        ProposerError::Transient(err.to_string())
    } else {
        ProposerError::Unavailable(err.to_string())
    }
}

impl TextProposer for HttpProposer {
    fn name(&self) -> &str {
        "http"
    }

    fn propose(&self, prompt: &str) -> Result<String, ProposerError> {
        let body = json!({
            "model": self.config.model,
            "temperature": 0.4,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
        });
        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().map_err(classify_transport)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(classify_status(status, text));
        }
        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ProposerError::Malformed(format!("unreadable response body: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProposerError::Malformed("response contained no message content".into()))
    }
}
