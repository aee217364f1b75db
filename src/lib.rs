//! voicebrief - voice-message digest pipeline
//!
//! Accepts "a voice message arrived" events from a chat platform, retrieves
//! the audio payload (which may lag the webhook), transcribes it, summarizes
//! the transcript, and pushes a single outcome message back to the sender.
//!
//! # Architecture
//!
//! The webhook boundary stays thin and stateless; the work happens in a
//! background pipeline per event:
//!
//! ```text
//! webhook → JobDispatcher.submit → worker pool → JobPipeline
//!             fetch (retry/backoff) → transcribe → summarize
//!               → compose (size ceiling) → push → artifact cleanup
//! ```
//!
//! Guarantees: exactly one outcome message per accepted event (delivery
//! failures are logged, not retried), and every temporary artifact gets a
//! release attempt on every exit path.
//!
//! # Modules
//!
//! - `adapters`: external system boundaries (content store, Whisper, Gemini, push)
//! - `fetch`: content retrieval with bounded exponential backoff
//! - `pipeline`: per-event orchestration and outcome classification
//! - `dispatch`: bounded worker pool with per-reference dedupe
//! - `compose`: outcome message formatting and truncation
//! - `artifacts`: scoped temp-file lifecycle
//! - `domain`: inbound event types and the extension gate
//! - `config`: immutable service configuration
//! - `cli`: command-line interface

pub mod adapters;
pub mod artifacts;
pub mod cli;
pub mod compose;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod fetch;
pub mod pipeline;

// Re-export main types at crate root for convenience
pub use adapters::{ContentResponse, ContentStore, Notifier, ServiceReply, Summarizer, Transcriber};
pub use artifacts::{ArtifactSet, RetentionPolicy};
pub use compose::{compose, JobOutcome, TranscriptHandle, MAX_MESSAGE_CHARS};
pub use config::Config;
pub use dispatch::{JobDispatcher, SubmitError};
pub use domain::{ContentKind, GateDecision, InboundEvent};
pub use fetch::{ContentFetcher, FetchOutcome, RetryPolicy};
pub use pipeline::{JobPipeline, JobReport};
