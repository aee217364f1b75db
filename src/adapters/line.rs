//! LINE Messaging API adapter: message content retrieval and push delivery.
//!
//! Content retrieval goes to the blob API host; a voice message's payload may
//! lag the webhook, in which case the endpoint answers 202 until transcoding
//! finishes. The raw status is passed through untouched so the fetcher can
//! apply its own classification.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::config::LineConfig;

use super::{ContentResponse, ContentStore, Notifier};

/// LINE Messaging API client
pub struct LineClient {
    access_token: String,
    api_base: String,
    blob_api_base: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

impl LineClient {
    pub fn new(
        access_token: impl Into<String>,
        api_base: impl Into<String>,
        blob_api_base: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            api_base: api_base.into(),
            blob_api_base: blob_api_base.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &LineConfig) -> Self {
        Self::new(
            config.access_token.clone(),
            config.api_base.clone(),
            config.blob_api_base.clone(),
        )
    }

    fn content_url(&self, reference: &str) -> String {
        format!("{}/v2/bot/message/{}/content", self.blob_api_base, reference)
    }

    fn push_url(&self) -> String {
        format!("{}/v2/bot/message/push", self.api_base)
    }
}

#[async_trait]
impl ContentStore for LineClient {
    async fn get_content(&self, reference: &str, timeout: Duration) -> Result<ContentResponse> {
        let url = self.content_url(reference);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .timeout(timeout)
            .send()
            .await
            .context("Content request failed")?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .context("Failed to read content body")?
            .to_vec();

        Ok(ContentResponse { status, body })
    }
}

#[async_trait]
impl Notifier for LineClient {
    async fn push(&self, recipient: &str, text: &str, timeout: Duration) -> Result<()> {
        let request = PushRequest {
            to: recipient,
            messages: vec![TextMessage { kind: "text", text }],
        };

        let response = self
            .client
            .post(self.push_url())
            .bearer_auth(&self.access_token)
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .context("Push request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Push rejected with status {}: {}", status, body.trim());
        }

        Ok(())
    }
}
