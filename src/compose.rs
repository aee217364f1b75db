//! Final message composition.
//!
//! Pure functions from a run's outcome (plus elapsed time) to the single text
//! delivered to the user. The platform rejects oversized messages, so the
//! composer enforces the ceiling here, truncating the body while keeping the
//! trailing timing suffix byte-for-byte intact.

use std::time::Duration;

use crate::fetch::FetchOutcome;

/// Platform message ceiling, in characters
pub const MAX_MESSAGE_CHARS: usize = 4900;

/// Marker inserted where a truncation cut the body
pub const TRUNCATION_MARKER: &str = "\n…(message truncated)";

/// Longest transcript excerpt embedded in a degraded-summary message
const EXCERPT_MAX_CHARS: usize = 800;

/// How a transcript is surfaced when the summary degrades
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptHandle {
    /// Public download URL for the persisted transcript
    Link(String),

    /// Inline excerpt, used when no public base URL is configured
    Excerpt(String),
}

impl TranscriptHandle {
    /// Build an inline excerpt from the full transcript
    pub fn excerpt_from(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.chars().count() <= EXCERPT_MAX_CHARS {
            return Self::Excerpt(trimmed.to_string());
        }
        let cut: String = trimmed.chars().take(EXCERPT_MAX_CHARS).collect();
        Self::Excerpt(format!("{cut}…"))
    }
}

/// Final classification of one pipeline run
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// Transcription and summarization both succeeded
    Summarized {
        summary: String,
        transcript: Option<TranscriptHandle>,
    },

    /// Transcript is good but the summarizer degraded; the transcript is
    /// surfaced instead (link or excerpt, never neither)
    SummaryDegraded {
        detail: String,
        transcript: TranscriptHandle,
    },

    /// The transcriber answered in a known failure mode
    TranscriptionDegraded { detail: String },

    /// The payload never became available
    ContentUnavailable(FetchOutcome),

    /// Unclassified failure; the user sees only a generic apology
    Internal,
}

impl JobOutcome {
    /// Short label for reports and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Summarized { .. } => "summarized",
            Self::SummaryDegraded { .. } => "summary_degraded",
            Self::TranscriptionDegraded { .. } => "transcription_degraded",
            Self::ContentUnavailable(_) => "content_unavailable",
            Self::Internal => "internal_error",
        }
    }
}

/// Render the outcome message, appending the timing suffix when elapsed time
/// is known and enforcing the size ceiling.
pub fn compose(outcome: &JobOutcome, elapsed: Option<Duration>) -> String {
    let body = render_body(outcome);
    let suffix = elapsed.map(elapsed_suffix).unwrap_or_default();
    enforce_limit(body, &suffix)
}

fn render_body(outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Summarized {
            summary,
            transcript,
        } => {
            let mut body = summary.trim().to_string();
            if let Some(handle) = transcript {
                body.push_str(&transcript_section(handle));
            }
            body
        }

        JobOutcome::SummaryDegraded { detail, transcript } => {
            format!(
                "Your message was transcribed, but the summary service hit a snag ({}).\
                 \nHere is the transcript instead:{}",
                detail.trim(),
                transcript_section(transcript),
            )
        }

        JobOutcome::TranscriptionDegraded { detail } => {
            format!(
                "Sorry, transcription ran into a problem: {}\nPlease try sending the message again later.",
                detail.trim(),
            )
        }

        JobOutcome::ContentUnavailable(fetch) => match fetch {
            FetchOutcome::NotReady { last_status } => format!(
                "Sorry, your audio was still not available after several attempts \
                 (last status {last_status}). Please resend it in a moment.",
            ),
            FetchOutcome::Permanent { status, detail } => format!(
                "Sorry, your message content could not be retrieved (status {status}): {}",
                detail.trim(),
            ),
            FetchOutcome::Transport { detail } => format!(
                "Sorry, a network problem kept us from retrieving your message: {}\
                 \nPlease try again later.",
                detail.trim(),
            ),
            // A ready payload never reaches this outcome; treat it like an
            // internal failure if it somehow does.
            FetchOutcome::Ready(_) => generic_apology(),
        },

        JobOutcome::Internal => generic_apology(),
    }
}

fn generic_apology() -> String {
    "Sorry, something unexpected went wrong while processing your message. \
     Please try again later."
        .to_string()
}

fn transcript_section(handle: &TranscriptHandle) -> String {
    match handle {
        TranscriptHandle::Link(url) => format!("\n\n📝 Full transcript: {url}"),
        TranscriptHandle::Excerpt(text) => format!("\n\n📝 Transcript excerpt:\n{text}"),
    }
}

/// Trailing timing annotation, e.g. `"\n\n⏱ 12.3s"`
pub fn elapsed_suffix(elapsed: Duration) -> String {
    format!("\n\n⏱ {:.1}s", elapsed.as_secs_f64())
}

/// Cap the message at [`MAX_MESSAGE_CHARS`], preserving `suffix` intact.
///
/// Space for the truncation marker and the suffix is reserved before the body
/// is cut, so the cut never lands inside either.
fn enforce_limit(body: String, suffix: &str) -> String {
    let body_chars = body.chars().count();
    let suffix_chars = suffix.chars().count();

    if body_chars + suffix_chars <= MAX_MESSAGE_CHARS {
        return format!("{body}{suffix}");
    }

    let marker_chars = TRUNCATION_MARKER.chars().count();
    let budget = MAX_MESSAGE_CHARS.saturating_sub(marker_chars + suffix_chars);

    let cut_at = body
        .char_indices()
        .nth(budget)
        .map(|(i, _)| i)
        .unwrap_or(body.len());

    format!("{}{}{}", &body[..cut_at], TRUNCATION_MARKER, suffix)
}
