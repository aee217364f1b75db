//! Inbound message events from the chat platform boundary.
//!
//! An `InboundEvent` is constructed once from a webhook payload (or the
//! worker's stdin feed) and moved into exactly one pipeline run.

use serde::{Deserialize, Serialize};

/// Audio file extensions accepted for generic file messages.
///
/// Native audio messages always enter the pipeline; a file message only
/// enters when its name ends in one of these (case-insensitive).
pub const ALLOWED_AUDIO_EXTENSIONS: &[&str] = &[".m4a", ".mp3", ".wav", ".aac", ".amr"];

/// What kind of message carried the content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Native voice/audio message
    Audio,

    /// Generic file attachment (gated by extension)
    File,
}

/// A "voice message arrived" notification from the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Platform user ID of the sender (push target)
    pub sender_id: String,

    /// Opaque reference used to retrieve the binary payload
    pub content_reference: String,

    /// Message kind the content arrived as
    pub content_kind: ContentKind,

    /// Sender display name, if the platform provided one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Original file name (file messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl InboundEvent {
    /// Create an event for a native audio message
    pub fn audio(sender_id: impl Into<String>, content_reference: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            content_reference: content_reference.into(),
            content_kind: ContentKind::Audio,
            display_name: None,
            file_name: None,
        }
    }

    /// Create an event for a file message
    pub fn file(
        sender_id: impl Into<String>,
        content_reference: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            content_reference: content_reference.into(),
            content_kind: ContentKind::File,
            display_name: None,
            file_name: Some(file_name.into()),
        }
    }

    /// Lowercased extension of the attached file, including the dot
    pub fn file_extension(&self) -> Option<String> {
        let name = self.file_name.as_deref()?;
        let dot = name.rfind('.')?;
        Some(name[dot..].to_ascii_lowercase())
    }

    /// Check whether this event may enter the pipeline.
    ///
    /// Audio messages are always accepted. File messages must carry an
    /// allow-listed audio extension; anything else is rejected with an
    /// explanatory reply and never spawns a run.
    pub fn gate(&self) -> GateDecision {
        match self.content_kind {
            ContentKind::Audio => GateDecision::Accepted,
            ContentKind::File => {
                let ext = self.file_extension();
                let allowed = ext
                    .as_deref()
                    .map(|e| ALLOWED_AUDIO_EXTENSIONS.contains(&e))
                    .unwrap_or(false);

                if allowed {
                    GateDecision::Accepted
                } else {
                    GateDecision::Rejected {
                        reply: format!(
                            "Sorry, I can only process audio files ({}). \
                             \"{}\" doesn't look like one.",
                            ALLOWED_AUDIO_EXTENSIONS.join(", "),
                            self.file_name.as_deref().unwrap_or("this file"),
                        ),
                    }
                }
            }
        }
    }
}

/// Result of the inbound gate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Event may be submitted to the dispatcher
    Accepted,

    /// Event is rejected before any run is spawned; `reply` explains why
    Rejected { reply: String },
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}
