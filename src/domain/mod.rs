//! Domain types for the voicebrief pipeline.
//!
//! - Events: inbound message notifications from the platform boundary
//! - Gate: extension allow-list check applied before dispatch

pub mod event;

// Re-export commonly used types
pub use event::{ContentKind, GateDecision, InboundEvent, ALLOWED_AUDIO_EXTENSIONS};
