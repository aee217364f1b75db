//! Scoped lifecycle for a run's temporary artifacts.
//!
//! Each pipeline run owns one [`ArtifactSet`]: the downloaded audio file and,
//! when a public transcript link is configured, the persisted transcript.
//! `release_all` is called on every exit path and attempts each tracked
//! artifact exactly once; a failed removal is logged and does not block the
//! rest.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Kinds of artifacts a run can acquire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Downloaded audio payload
    Audio,

    /// Persisted transcript text
    Transcript,
}

/// A tracked temporary resource
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// What happens to transcripts at run teardown.
///
/// Audio is always deleted. Transcripts back the public download link, so the
/// default keeps them; `DiscardAll` removes them with everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Remove every artifact, transcripts included
    DiscardAll,

    /// Keep transcript files so their links stay valid
    RetainTranscripts,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::RetainTranscripts
    }
}

/// Artifacts acquired during one pipeline run
pub struct ArtifactSet {
    work_dir: PathBuf,
    transcripts_dir: PathBuf,
    retention: RetentionPolicy,
    tracked: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn new(
        work_dir: impl Into<PathBuf>,
        transcripts_dir: impl Into<PathBuf>,
        retention: RetentionPolicy,
    ) -> Self {
        Self {
            work_dir: work_dir.into(),
            transcripts_dir: transcripts_dir.into(),
            retention,
            tracked: Vec::new(),
        }
    }

    /// Persist the downloaded audio bytes under the work directory.
    ///
    /// `extension` includes the leading dot (".m4a").
    pub async fn store_audio(
        &mut self,
        job_id: Uuid,
        extension: &str,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .with_context(|| format!("Failed to create work dir {}", self.work_dir.display()))?;

        let path = self.work_dir.join(format!("audio_{job_id}{extension}"));
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write audio to {}", path.display()))?;

        debug!(path = %path.display(), bytes = bytes.len(), "stored audio artifact");
        self.tracked.push(Artifact {
            kind: ArtifactKind::Audio,
            path: path.clone(),
        });
        Ok(path)
    }

    /// Persist the transcript under the public transcripts directory and
    /// return its path. The file name is `{job_id}.txt`, matching the URL the
    /// composer builds.
    pub async fn store_transcript(&mut self, job_id: Uuid, text: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.transcripts_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create transcripts dir {}",
                    self.transcripts_dir.display()
                )
            })?;

        let path = self.transcripts_dir.join(format!("{job_id}.txt"));
        tokio::fs::write(&path, text)
            .await
            .with_context(|| format!("Failed to write transcript to {}", path.display()))?;

        debug!(path = %path.display(), "stored transcript artifact");
        self.tracked.push(Artifact {
            kind: ArtifactKind::Transcript,
            path: path.clone(),
        });
        Ok(path)
    }

    /// Release every tracked artifact, once each.
    ///
    /// A removal failure is logged and the remaining artifacts are still
    /// attempted. Transcripts survive under `RetainTranscripts`.
    pub async fn release_all(&mut self) {
        for artifact in self.tracked.drain(..) {
            let retain = artifact.kind == ArtifactKind::Transcript
                && self.retention == RetentionPolicy::RetainTranscripts;

            if retain {
                debug!(path = %artifact.path.display(), "retaining transcript artifact");
                continue;
            }

            if let Err(e) = remove_if_present(&artifact.path).await {
                warn!(path = %artifact.path.display(), error = %e, "failed to release artifact");
            } else {
                debug!(path = %artifact.path.display(), "released artifact");
            }
        }
    }

    /// Paths currently tracked (test observability)
    pub fn tracked_paths(&self) -> Vec<PathBuf> {
        self.tracked.iter().map(|a| a.path.clone()).collect()
    }
}

async fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
