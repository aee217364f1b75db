//! Adapter interfaces for external systems.
//!
//! Adapters wrap the platform content store, the transcription backend, the
//! summarization backend, and the push channel behind narrow async traits so
//! the pipeline can be exercised against mocks.
//!
//! Backend-specific failure modes (model faults, filtered responses, API
//! errors) are classified *inside* the adapter and surfaced as
//! [`ServiceReply::Degraded`] — the pipeline branches on the variant, never on
//! substrings of the reply text.

pub mod gemini;
pub mod line;
pub mod whisper;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

pub use gemini::GeminiSummarizer;
pub use line::LineClient;
pub use whisper::WhisperTranscriber;

/// Reply from a text-producing service (transcriber or summarizer)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceReply {
    /// Usable text
    Text(String),

    /// The service answered, but in a known failure mode; `detail` carries
    /// the raw diagnostic for the outcome message and the logs
    Degraded(String),
}

impl ServiceReply {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Raw response from the content store boundary.
///
/// Status contract: 200 = payload ready in `body`, 202 = not ready yet,
/// anything else = permanent error with the error body in `body`.
#[derive(Debug, Clone)]
pub struct ContentResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ContentResponse {
    /// Error body as lossy UTF-8, for diagnostics
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Platform content store: resolves a content reference to raw bytes
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// One retrieval attempt. `Err` means a transport-level failure; status
    /// classification is the caller's job.
    async fn get_content(&self, reference: &str, timeout: Duration) -> Result<ContentResponse>;
}

/// Audio-to-text backend
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path, timeout: Duration) -> Result<ServiceReply>;
}

/// Text condensation backend
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, timeout: Duration) -> Result<ServiceReply>;
}

/// Outbound push channel to the originating user
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to `recipient`. The size ceiling is enforced by the
    /// composer before this call.
    async fn push(&self, recipient: &str, text: &str, timeout: Duration) -> Result<()>;
}
