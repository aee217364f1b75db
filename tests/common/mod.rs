//! Shared mock adapters for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use voicebrief::adapters::{
    ContentResponse, ContentStore, Notifier, ServiceReply, Summarizer, Transcriber,
};
use voicebrief::config::Config;

/// One scripted content store answer
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Status code plus body bytes
    Status(u16, Vec<u8>),

    /// Transport-level failure
    Transport(String),
}

/// Content store that replays a fixed script, one entry per attempt
pub struct ScriptedStore {
    script: Mutex<VecDeque<ScriptedResponse>>,
    calls: Mutex<u32>,
}

impl ScriptedStore {
    pub fn new(script: Vec<ScriptedResponse>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(0),
        }
    }

    /// 200 with the given payload
    pub fn ready(bytes: &[u8]) -> Self {
        Self::new(vec![ScriptedResponse::Status(200, bytes.to_vec())])
    }

    /// 202 repeated `n` times
    pub fn not_ready(n: usize) -> Self {
        Self::new(vec![ScriptedResponse::Status(202, Vec::new()); n])
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ContentStore for ScriptedStore {
    async fn get_content(&self, _reference: &str, _timeout: Duration) -> Result<ContentResponse> {
        *self.calls.lock().unwrap() += 1;
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("content store called more times than scripted");

        match next {
            ScriptedResponse::Status(status, body) => Ok(ContentResponse { status, body }),
            ScriptedResponse::Transport(detail) => Err(anyhow::anyhow!(detail)),
        }
    }
}

/// Transcriber returning a fixed reply, recording the audio paths it saw
pub struct MockTranscriber {
    reply: ServiceReply,
    pub seen_paths: Mutex<Vec<PathBuf>>,
}

impl MockTranscriber {
    pub fn replying(reply: ServiceReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            seen_paths: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.seen_paths.lock().unwrap().len()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio_path: &Path, _timeout: Duration) -> Result<ServiceReply> {
        assert!(
            audio_path.exists(),
            "audio artifact must exist while transcribing"
        );
        self.seen_paths.lock().unwrap().push(audio_path.to_path_buf());
        Ok(self.reply.clone())
    }
}

/// Summarizer returning a fixed reply, recording its inputs
pub struct MockSummarizer {
    reply: ServiceReply,
    pub inputs: Mutex<Vec<String>>,
}

impl MockSummarizer {
    pub fn replying(reply: ServiceReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, text: &str, _timeout: Duration) -> Result<ServiceReply> {
        self.inputs.lock().unwrap().push(text.to_string());
        Ok(self.reply.clone())
    }
}

/// Notifier recording pushes, optionally failing every delivery
pub struct MockNotifier {
    pub pushes: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl MockNotifier {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            pushes: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            pushes: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.pushes.lock().unwrap().len()
    }

    pub fn last_message(&self) -> String {
        self.pushes
            .lock()
            .unwrap()
            .last()
            .map(|(_, text)| text.clone())
            .expect("no push recorded")
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn push(&self, recipient: &str, text: &str, _timeout: Duration) -> Result<()> {
        self.pushes
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        if self.fail {
            anyhow::bail!("push channel unavailable");
        }
        Ok(())
    }
}

/// Config rooted in a temp dir, with the default retry schedule
pub fn test_config(temp: &TempDir) -> Config {
    let mut config = Config::default();
    config.work_dir = temp.path().join("tmp");
    config.static_dir = temp.path().join("static");
    config
}
