//! Gemini summarization backend.
//!
//! Calls the generateContent REST endpoint with a short digest prompt.
//! Anything that keeps a summary from coming back (request failure, API
//! error body, an empty candidate list from content filtering) classifies as
//! [`ServiceReply::Degraded`]: the user still gets the transcript, just not a
//! summary.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::GeminiConfig;

use super::{ServiceReply, Summarizer};

/// Fixed reply for empty or whitespace-only transcripts; the backend is
/// never called for these.
pub const EMPTY_INPUT_REPLY: &str = "There was nothing to summarize in that message.";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Summarizer backed by the Gemini API
pub struct GeminiSummarizer {
    api_key: String,
    model: String,
    api_base: String,
    client: reqwest::Client,
}

impl GeminiSummarizer {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            api_base: api_base.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &GeminiConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.model.clone(),
            config.api_base.clone(),
        )
    }

    fn api_url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.api_base, self.model, self.api_key
        )
    }

    fn build_request(text: &str) -> GenerateContentRequest {
        let prompt = format!(
            "Summarize the following message concisely. Pull out the key \
             points, as a short list or a single paragraph, within about 100 \
             words.\n\nMessage:\n{text}\n\nSummary:"
        );
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        }
    }

    fn extract_summary(response: GenerateContentResponse) -> ServiceReply {
        if let Some(error) = response.error {
            warn!(message = %error.message, "gemini returned an API error");
            return ServiceReply::Degraded(format!("summary service error: {}", error.message));
        }

        let text = response
            .candidates
            .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|mut p| if p.is_empty() { None } else { p.remove(0).text });

        match text {
            Some(t) if !t.trim().is_empty() => ServiceReply::Text(t.trim().to_string()),
            _ => {
                warn!("gemini produced no candidates");
                ServiceReply::Degraded("the model produced no summary for this content".to_string())
            }
        }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, text: &str, timeout: Duration) -> Result<ServiceReply> {
        if text.trim().is_empty() {
            return Ok(ServiceReply::Text(EMPTY_INPUT_REPLY.to_string()));
        }

        let request = Self::build_request(text);

        let response = match self
            .client
            .post(self.api_url())
            .timeout(timeout)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "summary request failed");
                return Ok(ServiceReply::Degraded(format!("summary request failed: {e}")));
            }
        };

        let parsed: GenerateContentResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "unreadable summary response");
                return Ok(ServiceReply::Degraded(format!(
                    "unreadable summary response: {e}"
                )));
            }
        };

        Ok(Self::extract_summary(parsed))
    }
}
