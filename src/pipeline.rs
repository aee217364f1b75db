//! End-to-end job pipeline.
//!
//! One run per inbound event: fetch the payload, transcribe, summarize,
//! compose the outcome message, push it, clean up. Whatever happens in the
//! middle, the sender receives exactly one outcome message (unless the push
//! itself fails, which is logged and not retried — there is no channel left
//! to report a delivery failure on) and every acquired artifact gets a
//! release attempt.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{ContentStore, Notifier, ServiceReply, Summarizer, Transcriber};
use crate::artifacts::ArtifactSet;
use crate::compose::{compose, JobOutcome, TranscriptHandle};
use crate::config::Config;
use crate::domain::InboundEvent;
use crate::fetch::{ContentFetcher, FetchOutcome};

/// Fallback extension for native audio messages (platform voice notes are
/// AAC in an m4a container)
const DEFAULT_AUDIO_EXTENSION: &str = ".m4a";

/// What one run did, for the CLI and for tests
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job_id: Uuid,
    pub sender_id: String,
    pub outcome: &'static str,
    pub message: String,
    pub delivered: bool,
    pub elapsed: std::time::Duration,
    pub started_at: DateTime<Utc>,
}

/// Orchestrates one fetch → transcribe → summarize → deliver run per event
pub struct JobPipeline {
    config: Arc<Config>,
    fetcher: ContentFetcher,
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<dyn Summarizer>,
    notifier: Arc<dyn Notifier>,
}

impl JobPipeline {
    pub fn new(
        config: Arc<Config>,
        content_store: Arc<dyn ContentStore>,
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<dyn Summarizer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let fetcher = ContentFetcher::new(
            content_store,
            config.retry.clone(),
            config.timeouts.fetch_attempt(),
        );
        Self {
            config,
            fetcher,
            transcriber,
            summarizer,
            notifier,
        }
    }

    /// Run the pipeline for one event.
    ///
    /// Never returns an error: stage failures are absorbed into the outcome
    /// message, delivery failures are logged, and artifact release runs on
    /// every path.
    #[instrument(skip(self, event), fields(sender = %event.sender_id, reference = %event.content_reference))]
    pub async fn run(&self, event: InboundEvent) -> JobReport {
        let job_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();
        info!(%job_id, "starting job");

        let mut artifacts = ArtifactSet::new(
            self.config.work_dir.clone(),
            self.config.transcripts_dir(),
            self.config.retention,
        );

        let outcome = match self.run_stages(job_id, &event, &mut artifacts).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(%job_id, error = ?e, "pipeline stage failed");
                JobOutcome::Internal
            }
        };

        let elapsed = started.elapsed();
        let message = compose(&outcome, Some(elapsed));
        info!(
            %job_id,
            outcome = outcome.label(),
            chars = message.chars().count(),
            "composed outcome message"
        );

        let delivered = match self
            .notifier
            .push(&event.sender_id, &message, self.config.timeouts.push())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                // Terminal: no retry, no secondary channel.
                error!(%job_id, error = %e, "failed to deliver outcome message");
                false
            }
        };

        artifacts.release_all().await;

        info!(%job_id, delivered, elapsed_ms = elapsed.as_millis() as u64, "job finished");
        JobReport {
            job_id,
            sender_id: event.sender_id,
            outcome: outcome.label(),
            message,
            delivered,
            elapsed,
            started_at,
        }
    }

    /// Stages 1–6: everything up to (not including) delivery
    async fn run_stages(
        &self,
        job_id: Uuid,
        event: &InboundEvent,
        artifacts: &mut ArtifactSet,
    ) -> Result<JobOutcome> {
        // Fetching
        let bytes = match self.fetcher.fetch(&event.content_reference).await {
            FetchOutcome::Ready(bytes) => bytes,
            unavailable => return Ok(JobOutcome::ContentUnavailable(unavailable)),
        };

        let extension = event
            .file_extension()
            .unwrap_or_else(|| DEFAULT_AUDIO_EXTENSION.to_string());
        let audio_path = artifacts.store_audio(job_id, &extension, &bytes).await?;

        // Transcribing
        let transcript = match self
            .transcriber
            .transcribe(&audio_path, self.config.timeouts.transcribe())
            .await?
        {
            ServiceReply::Text(text) => text,
            ServiceReply::Degraded(detail) => {
                return Ok(JobOutcome::TranscriptionDegraded { detail });
            }
        };

        // Persist the transcript for its download link; failure here only
        // downgrades the message shape, never the run.
        let link = self.expose_transcript(job_id, &transcript, artifacts).await;

        // Summarizing
        let outcome = match self
            .summarizer
            .summarize(&transcript, self.config.timeouts.summarize())
            .await?
        {
            ServiceReply::Text(summary) => JobOutcome::Summarized {
                summary,
                transcript: link.map(TranscriptHandle::Link),
            },
            ServiceReply::Degraded(detail) => JobOutcome::SummaryDegraded {
                detail,
                transcript: link
                    .map(TranscriptHandle::Link)
                    .unwrap_or_else(|| TranscriptHandle::excerpt_from(&transcript)),
            },
        };

        Ok(outcome)
    }

    /// Persist the transcript and return its public URL, when one is
    /// configured. Absence of configuration and persistence failures both
    /// degrade gracefully to `None` (the composer falls back to an excerpt).
    async fn expose_transcript(
        &self,
        job_id: Uuid,
        transcript: &str,
        artifacts: &mut ArtifactSet,
    ) -> Option<String> {
        let url = self.config.transcript_url(job_id)?;

        match artifacts.store_transcript(job_id, transcript).await {
            Ok(_) => Some(url),
            Err(e) => {
                warn!(%job_id, error = %e, "failed to persist transcript, falling back to excerpt");
                None
            }
        }
    }
}
