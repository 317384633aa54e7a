//! Configuration primitives for ResearchIntake.
//!
//! Stored as TOML at `<workspace>/config/config.toml`. Every knob below is an
//! empirically chosen constant from the interview heuristics; keeping them in
//! config lets deployments tune scoring and dedup without a rebuild.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::config_file_path;

/// Root configuration persisted per installation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub interview: InterviewSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub dedup: DuplicateSettings,
    #[serde(default)]
    pub proposer: ProposerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Turn-loop limits and context-window shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSettings {
    /// Absolute ceiling on turns regardless of mode.
    #[serde(default = "default_hard_turn_cap")]
    pub hard_turn_cap: usize,
    /// Upper bound on gaps reported per analysis.
    #[serde(default = "default_max_gaps")]
    pub max_gaps: usize,
    /// Turns of history required before mode transitions are evaluated.
    #[serde(default = "default_transition_min_turns")]
    pub transition_min_turns: usize,
    /// Only this many transitions are announced to the user.
    #[serde(default = "default_visible_transition_limit")]
    pub visible_transition_limit: usize,
    /// Past this many turns the proposer only sees a condensed context.
    #[serde(default = "default_condensed_after_turns")]
    pub condensed_after_turns: usize,
    #[serde(default = "default_condensed_recent_turns")]
    pub condensed_recent_turns: usize,
    #[serde(default = "default_condensed_answer_chars")]
    pub condensed_answer_chars: usize,
    #[serde(default = "default_condensed_profile_entries")]
    pub condensed_profile_entries: usize,
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            hard_turn_cap: default_hard_turn_cap(),
            max_gaps: default_max_gaps(),
            transition_min_turns: default_transition_min_turns(),
            visible_transition_limit: default_visible_transition_limit(),
            condensed_after_turns: default_condensed_after_turns(),
            condensed_recent_turns: default_condensed_recent_turns(),
            condensed_answer_chars: default_condensed_answer_chars(),
            condensed_profile_entries: default_condensed_profile_entries(),
        }
    }
}

const fn default_hard_turn_cap() -> usize {
    12
}

const fn default_max_gaps() -> usize {
    7
}

const fn default_transition_min_turns() -> usize {
    2
}

const fn default_visible_transition_limit() -> usize {
    2
}

const fn default_condensed_after_turns() -> usize {
    2
}

const fn default_condensed_recent_turns() -> usize {
    2
}

const fn default_condensed_answer_chars() -> usize {
    160
}

const fn default_condensed_profile_entries() -> usize {
    5
}

/// Completion scoring weights and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    #[serde(default = "default_breadth_weight")]
    pub breadth_weight: f64,
    #[serde(default = "default_depth_weight")]
    pub depth_weight: f64,
    #[serde(default = "default_progress_weight")]
    pub progress_weight: f64,
    #[serde(default = "default_sufficient_threshold")]
    pub sufficient_threshold: f64,
    #[serde(default = "default_minimal_threshold")]
    pub minimal_threshold: f64,
    #[serde(default = "default_critical_gap_penalty")]
    pub critical_gap_penalty: f64,
    #[serde(default = "default_important_gap_penalty")]
    pub important_gap_penalty: f64,
    /// Breadth never reads lower than this once any profile data exists.
    #[serde(default = "default_breadth_floor")]
    pub breadth_floor: f64,
    #[serde(default = "default_text_richness_cap")]
    pub text_richness_cap: usize,
    #[serde(default = "default_list_richness_cap")]
    pub list_richness_cap: usize,
    #[serde(default = "default_map_richness_cap")]
    pub map_richness_cap: usize,
    /// Confidence reported when assessment itself fails.
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            breadth_weight: default_breadth_weight(),
            depth_weight: default_depth_weight(),
            progress_weight: default_progress_weight(),
            sufficient_threshold: default_sufficient_threshold(),
            minimal_threshold: default_minimal_threshold(),
            critical_gap_penalty: default_critical_gap_penalty(),
            important_gap_penalty: default_important_gap_penalty(),
            breadth_floor: default_breadth_floor(),
            text_richness_cap: default_text_richness_cap(),
            list_richness_cap: default_list_richness_cap(),
            map_richness_cap: default_map_richness_cap(),
            fallback_confidence: default_fallback_confidence(),
        }
    }
}

const fn default_breadth_weight() -> f64 {
    0.4
}

const fn default_depth_weight() -> f64 {
    0.4
}

const fn default_progress_weight() -> f64 {
    0.2
}

const fn default_sufficient_threshold() -> f64 {
    0.65
}

const fn default_minimal_threshold() -> f64 {
    0.35
}

const fn default_critical_gap_penalty() -> f64 {
    0.2
}

const fn default_important_gap_penalty() -> f64 {
    0.1
}

const fn default_breadth_floor() -> f64 {
    0.3
}

const fn default_text_richness_cap() -> usize {
    100
}

const fn default_list_richness_cap() -> usize {
    5
}

const fn default_map_richness_cap() -> usize {
    3
}

const fn default_fallback_confidence() -> f64 {
    0.3
}

/// Duplicate-question thresholds for the strict and lenient profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateSettings {
    /// Strict comparison applies while fewer than this many turns exist.
    #[serde(default = "default_strict_turn_limit")]
    pub strict_turn_limit: usize,
    #[serde(default = "default_strict_min_shared_buckets")]
    pub strict_min_shared_buckets: usize,
    #[serde(default = "default_strict_word_overlap")]
    pub strict_word_overlap: f64,
    #[serde(default = "default_strict_char_overlap")]
    pub strict_char_overlap: f64,
    /// Lenient comparison only looks at this many of the latest questions.
    #[serde(default = "default_lenient_window")]
    pub lenient_window: usize,
    #[serde(default = "default_lenient_word_overlap")]
    pub lenient_word_overlap: f64,
    #[serde(default = "default_lenient_char_overlap")]
    pub lenient_char_overlap: f64,
}

impl Default for DuplicateSettings {
    fn default() -> Self {
        Self {
            strict_turn_limit: default_strict_turn_limit(),
            strict_min_shared_buckets: default_strict_min_shared_buckets(),
            strict_word_overlap: default_strict_word_overlap(),
            strict_char_overlap: default_strict_char_overlap(),
            lenient_window: default_lenient_window(),
            lenient_word_overlap: default_lenient_word_overlap(),
            lenient_char_overlap: default_lenient_char_overlap(),
        }
    }
}

const fn default_strict_turn_limit() -> usize {
    2
}

const fn default_strict_min_shared_buckets() -> usize {
    2
}

const fn default_strict_word_overlap() -> f64 {
    0.5
}

const fn default_strict_char_overlap() -> f64 {
    0.8
}

const fn default_lenient_window() -> usize {
    3
}

const fn default_lenient_word_overlap() -> f64 {
    0.7
}

const fn default_lenient_char_overlap() -> f64 {
    0.9
}

/// External question proposer: endpoint plus retry/latency policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposerSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,
    #[serde(default = "default_max_backoff_units")]
    pub max_backoff_units: u32,
    /// Responses slower than this are logged.
    #[serde(default = "default_slow_response_ms")]
    pub slow_response_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// OpenAI-compatible chat completions URL. Unset means offline.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl ProposerSettings {
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    pub fn slow_response(&self) -> Duration {
        Duration::from_millis(self.slow_response_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProposerSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_unit_ms: default_backoff_unit_ms(),
            max_backoff_units: default_max_backoff_units(),
            slow_response_ms: default_slow_response_ms(),
            timeout_ms: default_timeout_ms(),
            endpoint: None,
            model: default_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_backoff_unit_ms() -> u64 {
    1_000
}

const fn default_max_backoff_units() -> u32 {
    5
}

const fn default_slow_response_ms() -> u64 {
    10_000
}

const fn default_timeout_ms() -> u64 {
    30_000
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "RESEARCHINTAKE_API_KEY".to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Loads the configuration from the default location or returns defaults.
pub fn load_or_default() -> Result<AppConfig> {
    load_from(&config_file_path()?)
}

/// Loads the configuration from an explicit path, falling back to defaults
/// when the file does not exist.
pub fn load_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let cfg: AppConfig =
        toml::from_str(&data).with_context(|| format!("Failed to parse config file {:?}", path))?;
    Ok(cfg)
}

/// Persists the configuration at the default location and returns the path written.
pub fn save(config: &AppConfig) -> Result<PathBuf> {
    let path = config_file_path()?;
    save_to(config, &path)?;
    Ok(path)
}

/// Persists the configuration at an explicit path.
pub fn save_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory {:?}", dir))?;
    }
    let data = toml::to_string_pretty(config)?;
    fs::write(path, data).with_context(|| format!("Failed to write config file {:?}", path))?;
    Ok(())
}
