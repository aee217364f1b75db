//! Command-line interface for voicebrief.
//!
//! `process` runs one event end to end (handy for debugging a single
//! message), `worker` drains a JSONL event feed from stdin through the
//! dispatcher, and `config` prints the resolved configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::adapters::{
    ContentStore, GeminiSummarizer, LineClient, Notifier, WhisperTranscriber,
};
use crate::config::Config;
use crate::dispatch::JobDispatcher;
use crate::domain::{ContentKind, GateDecision, InboundEvent};
use crate::pipeline::{JobPipeline, JobReport};

/// voicebrief - voice-message digest pipeline
#[derive(Parser, Debug)]
#[command(name = "voicebrief")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a YAML config file (default: ~/.voicebrief/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a single message event end to end
    Process {
        /// Platform user ID of the sender
        #[arg(long)]
        sender_id: String,

        /// Content reference (message ID) to retrieve
        #[arg(long)]
        reference: String,

        /// Message kind
        #[arg(long, value_enum, default_value_t = KindArg::Audio)]
        kind: KindArg,

        /// File name (file messages only; gated by extension)
        #[arg(long)]
        file_name: Option<String>,
    },

    /// Read JSON events from stdin (one per line) and process them
    /// concurrently through the worker pool
    Worker,

    /// Show resolved configuration (secrets redacted)
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Audio,
    File,
}

impl From<KindArg> for ContentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Audio => ContentKind::Audio,
            KindArg::File => ContentKind::File,
        }
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = Arc::new(Config::load(self.config.as_deref())?);

        match self.command {
            Commands::Config => {
                let yaml = serde_yaml::to_string(&config.redacted())
                    .context("Failed to render configuration")?;
                println!("{yaml}");
                Ok(())
            }

            Commands::Process {
                sender_id,
                reference,
                kind,
                file_name,
            } => {
                let event = InboundEvent {
                    sender_id,
                    content_reference: reference,
                    content_kind: kind.into(),
                    display_name: None,
                    file_name,
                };

                if let GateDecision::Rejected { reply } = event.gate() {
                    println!("Rejected before dispatch: {reply}");
                    return Ok(());
                }

                let (pipeline, _line) = build_pipeline(&config);
                let report = pipeline.run(event).await;
                print_report(&report);
                Ok(())
            }

            Commands::Worker => {
                let (pipeline, line) = build_pipeline(&config);
                let dispatcher = JobDispatcher::start(
                    pipeline,
                    config.dispatch.workers,
                    config.dispatch.queue_capacity,
                );

                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                while let Some(line_text) = lines.next_line().await? {
                    if line_text.trim().is_empty() {
                        continue;
                    }

                    let event: InboundEvent = match serde_json::from_str(&line_text) {
                        Ok(event) => event,
                        Err(e) => {
                            warn!(error = %e, "skipping unparsable event line");
                            continue;
                        }
                    };

                    // Gate rejections short-circuit with an explanatory reply
                    // and never spawn a run.
                    if let GateDecision::Rejected { reply } = event.gate() {
                        info!(sender = %event.sender_id, "rejecting unsupported file");
                        if let Err(e) = line
                            .push(&event.sender_id, &reply, config.timeouts.push())
                            .await
                        {
                            error!(error = %e, "failed to send rejection reply");
                        }
                        continue;
                    }

                    if let Err(e) = dispatcher.submit(event) {
                        warn!(error = %e, "submission rejected");
                    }
                }

                info!("event feed closed, draining queue");
                dispatcher.shutdown().await;
                Ok(())
            }
        }
    }
}

/// Wire the production adapters into a pipeline. The LINE client serves as
/// both content store and notifier.
fn build_pipeline(config: &Arc<Config>) -> (Arc<JobPipeline>, Arc<LineClient>) {
    let line = Arc::new(LineClient::from_config(&config.line));
    let content_store: Arc<dyn ContentStore> = line.clone();
    let notifier: Arc<dyn Notifier> = line.clone();

    let pipeline = JobPipeline::new(
        Arc::clone(config),
        content_store,
        Arc::new(WhisperTranscriber::from_config(&config.whisper)),
        Arc::new(GeminiSummarizer::from_config(&config.gemini)),
        notifier,
    );

    (Arc::new(pipeline), line)
}

fn print_report(report: &JobReport) {
    println!("Job:       {}", report.job_id);
    println!("Sender:    {}", report.sender_id);
    println!("Outcome:   {}", report.outcome);
    println!("Delivered: {}", report.delivered);
    println!("Elapsed:   {:.1}s", report.elapsed.as_secs_f64());
    println!("--- message ---");
    println!("{}", report.message);
}
