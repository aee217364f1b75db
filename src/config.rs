//! Service configuration.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables for secrets (LINE_CHANNEL_ACCESS_TOKEN,
//!    GEMINI_API_KEY, WHISPER_PATH, VOICEBRIEF_PUBLIC_BASE_URL)
//! 2. Config file (YAML, `--config` flag or ~/.voicebrief/config.yaml)
//! 3. Defaults
//!
//! The resolved [`Config`] is built once in `main` and shared read-only via
//! `Arc`; nothing mutates it after startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::artifacts::RetentionPolicy;
use crate::fetch::RetryPolicy;

/// Resolved, immutable service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat platform credentials and endpoints
    pub line: LineConfig,

    /// Local transcription backend
    pub whisper: WhisperConfig,

    /// Summarization backend
    pub gemini: GeminiConfig,

    /// Public base URL for transcript links. When unset, degraded-summary
    /// messages embed a transcript excerpt instead of a link.
    pub public_base_url: Option<String>,

    /// Root of statically served files (transcripts live under
    /// `static_dir/transcripts/`)
    pub static_dir: PathBuf,

    /// Scratch directory for downloaded audio
    pub work_dir: PathBuf,

    /// Content fetch retry schedule
    pub retry: RetryPolicy,

    /// Per-stage deadlines for external calls
    pub timeouts: TimeoutConfig,

    /// Worker pool sizing
    pub dispatch: DispatchConfig,

    /// Transcript retention at run teardown
    pub retention: RetentionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Channel access token (bearer auth for both APIs)
    pub access_token: String,

    /// Messaging API base (push)
    pub api_base: String,

    /// Blob API base (message content)
    pub blob_api_base: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_base: "https://api.line.me".to_string(),
            blob_api_base: "https://api-data.line.me".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    /// Path to the whisper binary
    pub binary_path: String,

    /// Model name passed to `--model`
    pub model: String,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            binary_path: "whisper".to_string(),
            model: "large".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for one content fetch attempt
    pub fetch_attempt_secs: u64,

    /// Deadline for a transcription run
    pub transcribe_secs: u64,

    /// Deadline for a summarization call
    pub summarize_secs: u64,

    /// Deadline for the outbound push
    pub push_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch_attempt_secs: 30,
            transcribe_secs: 600,
            summarize_secs: 60,
            push_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn fetch_attempt(&self) -> Duration {
        Duration::from_secs(self.fetch_attempt_secs)
    }
    pub fn transcribe(&self) -> Duration {
        Duration::from_secs(self.transcribe_secs)
    }
    pub fn summarize(&self) -> Duration {
        Duration::from_secs(self.summarize_secs)
    }
    pub fn push(&self) -> Duration {
        Duration::from_secs(self.push_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Concurrent pipeline workers
    pub workers: usize,

    /// Bounded submission queue depth
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 64,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = voicebrief_home();
        Self {
            line: LineConfig::default(),
            whisper: WhisperConfig::default(),
            gemini: GeminiConfig::default(),
            public_base_url: None,
            static_dir: home.join("static"),
            work_dir: home.join("tmp"),
            retry: RetryPolicy::default(),
            timeouts: TimeoutConfig::default(),
            dispatch: DispatchConfig::default(),
            retention: RetentionPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from an optional YAML file plus env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = voicebrief_home().join("config.yaml");
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(token) = std::env::var("LINE_CHANNEL_ACCESS_TOKEN") {
            config.line.access_token = token;
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.gemini.api_key = key;
        }
        if let Ok(path) = std::env::var("WHISPER_PATH") {
            config.whisper.binary_path = path;
        }
        if let Ok(url) = std::env::var("VOICEBRIEF_PUBLIC_BASE_URL") {
            config.public_base_url = Some(url);
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Directory where transcripts are persisted for static serving
    pub fn transcripts_dir(&self) -> PathBuf {
        self.static_dir.join("transcripts")
    }

    /// Public download URL for a job's transcript, when a base URL is set
    pub fn transcript_url(&self, job_id: Uuid) -> Option<String> {
        let base = self.public_base_url.as_deref()?.trim_end_matches('/');
        Some(format!("{base}/static/transcripts/{job_id}.txt"))
    }

    /// Copy with secrets blanked, for the `config` debug command
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.line.access_token.is_empty() {
            copy.line.access_token = "<redacted>".to_string();
        }
        if !copy.gemini.api_key.is_empty() {
            copy.gemini.api_key = "<redacted>".to_string();
        }
        copy
    }
}

fn voicebrief_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".voicebrief")
}
