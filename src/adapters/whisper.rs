//! Local Whisper transcription backend.
//!
//! Shells out to the whisper CLI with JSON output. Backend failure modes
//! (non-zero exit, model faults that surface inside the output text, a run
//! that blows its deadline) classify as [`ServiceReply::Degraded`] rather
//! than hard errors, so the pipeline can apologize specifically.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

use crate::config::WhisperConfig;

use super::{ServiceReply, Transcriber};

/// Known model-fault fragments that Whisper emits inside its output instead
/// of failing the process. A transcript containing one of these is garbage.
const MODEL_FAULT_MARKERS: &[&str] = &[
    "Expected key.size",
    "Key and Value must have the same sequence length",
];

/// Whisper JSON output shape
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    text: String,
}

/// Transcriber backed by a local whisper binary
pub struct WhisperTranscriber {
    binary_path: String,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(binary_path: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &WhisperConfig) -> Self {
        Self::new(config.binary_path.clone(), config.model.clone())
    }

    fn classify(text: String) -> ServiceReply {
        for marker in MODEL_FAULT_MARKERS {
            if text.contains(marker) {
                warn!(marker, "whisper output carries a model fault");
                return ServiceReply::Degraded(text);
            }
        }
        ServiceReply::Text(text)
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path, deadline: Duration) -> Result<ServiceReply> {
        let temp_dir = tempfile::tempdir().context("Failed to create whisper output dir")?;

        let run = Command::new(&self.binary_path)
            .arg(audio_path)
            .arg("--model")
            .arg(&self.model)
            .arg("--output_dir")
            .arg(temp_dir.path())
            .arg("--output_format")
            .arg("json")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = match timeout(deadline, run).await {
            Ok(result) => result.context("Failed to run whisper")?,
            Err(_) => {
                warn!(deadline_secs = deadline.as_secs(), "whisper run timed out");
                return Ok(ServiceReply::Degraded(format!(
                    "transcription timed out after {}s",
                    deadline.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(code = output.status.code(), "whisper exited with failure");
            return Ok(ServiceReply::Degraded(format!(
                "transcription backend failed: {}",
                stderr.trim()
            )));
        }

        let stem = audio_path.file_stem().unwrap_or_default().to_string_lossy();
        let json_path = temp_dir.path().join(format!("{stem}.json"));

        let json_content = tokio::fs::read_to_string(&json_path)
            .await
            .context("Failed to read whisper output")?;

        let parsed: WhisperOutput =
            serde_json::from_str(&json_content).context("Failed to parse whisper JSON")?;

        Ok(Self::classify(parsed.text.trim().to_string()))
    }
}
