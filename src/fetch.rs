//! Content retrieval with bounded retry and exponential backoff.
//!
//! The platform's content store may answer 202 ("accepted, not ready") for a
//! while after the webhook fires. The fetcher retries those — and transport
//! failures — on a doubling backoff schedule, and gives up immediately on any
//! other status, which is deterministic and not worth burning the budget on.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapters::ContentStore;

/// Final classification of a fetch
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Payload retrieved in full
    Ready(Vec<u8>),

    /// Still not ready after the whole attempt budget
    NotReady { last_status: u16 },

    /// Non-200/202 status; retrying would not help
    Permanent { status: u16, detail: String },

    /// Transport failures exhausted the attempt budget
    Transport { detail: String },
}

impl FetchOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Retry schedule for not-ready and transport failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Ceiling on the backoff delay, in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Delay multiplier applied per retry
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_initial_delay() -> u64 {
    3000
}
fn default_max_delay() -> u64 {
    30000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows attempt number `attempt` (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::from_millis(self.initial_delay_ms.min(self.max_delay_ms));
        }

        let delay =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);

        let capped = delay.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(capped)
    }

    /// Whether another attempt is allowed after `attempt` attempts
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Retrieves raw bytes for a content reference, absorbing "not ready" answers
pub struct ContentFetcher {
    store: Arc<dyn ContentStore>,
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

impl ContentFetcher {
    pub fn new(store: Arc<dyn ContentStore>, policy: RetryPolicy, attempt_timeout: Duration) -> Self {
        Self {
            store,
            policy,
            attempt_timeout,
        }
    }

    /// Fetch the payload for `reference`, classifying the result.
    ///
    /// Never returns partial bytes: only a 200 with its full body counts as
    /// `Ready`.
    pub async fn fetch(&self, reference: &str) -> FetchOutcome {
        let mut attempt = 0u32;
        let mut last_error: Option<String> = None;

        loop {
            attempt += 1;

            match self.store.get_content(reference, self.attempt_timeout).await {
                Ok(response) => match response.status {
                    200 => {
                        debug!(reference, attempt, bytes = response.body.len(), "content ready");
                        return FetchOutcome::Ready(response.body);
                    }
                    202 => {
                        last_error = None;
                        if !self.policy.should_retry(attempt) {
                            warn!(reference, attempt, "content still not ready, giving up");
                            return FetchOutcome::NotReady { last_status: 202 };
                        }
                    }
                    status => {
                        let detail = response.body_text();
                        warn!(reference, attempt, status, %detail, "permanent content store error");
                        return FetchOutcome::Permanent { status, detail };
                    }
                },
                Err(e) => {
                    last_error = Some(e.to_string());
                    if !self.policy.should_retry(attempt) {
                        warn!(reference, attempt, error = %e, "transport failures exhausted retry budget");
                        return FetchOutcome::Transport {
                            detail: e.to_string(),
                        };
                    }
                }
            }

            let delay = self.policy.delay_for_attempt(attempt);
            debug!(
                reference,
                attempt,
                delay_ms = delay.as_millis() as u64,
                not_ready = last_error.is_none(),
                "content not available yet, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
