//! Job dispatch: bounded worker pool over a submission queue.
//!
//! The webhook boundary calls [`JobDispatcher::submit`] and returns to its
//! caller immediately; a fixed pool of workers drains the queue and runs one
//! pipeline per event. An in-flight set keyed by content reference gives
//! at-most-one-concurrent-run-per-reference, so a redelivered webhook cannot
//! double-process a message.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::InboundEvent;
use crate::pipeline::JobPipeline;

/// Why a submission was rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a run for content reference '{reference}' is already in flight")]
    Duplicate { reference: String },

    #[error("submission queue is full")]
    QueueFull,

    #[error("dispatcher is shutting down")]
    ShuttingDown,
}

/// Bounded dispatcher feeding a fixed worker pool
pub struct JobDispatcher {
    tx: mpsc::Sender<InboundEvent>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    workers: Vec<JoinHandle<()>>,
}

impl JobDispatcher {
    /// Spawn the worker pool and return the dispatcher handle
    pub fn start(pipeline: Arc<JobPipeline>, workers: usize, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel::<InboundEvent>(queue_capacity.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let in_flight: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));

        let workers = (0..workers.max(1))
            .map(|worker_id| {
                let pipeline = Arc::clone(&pipeline);
                let rx = Arc::clone(&rx);
                let in_flight = Arc::clone(&in_flight);
                tokio::spawn(async move {
                    worker_loop(worker_id, pipeline, rx, in_flight).await;
                })
            })
            .collect();

        Self {
            tx,
            in_flight,
            workers,
        }
    }

    /// Submit an event for background processing. Non-blocking: the caller
    /// gets an immediate accept/reject and never waits on the pipeline.
    pub fn submit(&self, event: InboundEvent) -> Result<(), SubmitError> {
        let reference = event.content_reference.clone();

        // Reserve the reference before queueing so a concurrent duplicate
        // cannot slip in between enqueue and worker pickup.
        {
            let mut set = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
            if !set.insert(reference.clone()) {
                debug!(%reference, "duplicate submission ignored");
                return Err(SubmitError::Duplicate { reference });
            }
        }

        match self.tx.try_send(event) {
            Ok(()) => {
                debug!(%reference, "event queued");
                Ok(())
            }
            Err(e) => {
                self.clear_in_flight(&reference);
                match e {
                    TrySendError::Full(_) => {
                        warn!(%reference, "submission queue full, rejecting event");
                        Err(SubmitError::QueueFull)
                    }
                    TrySendError::Closed(_) => Err(SubmitError::ShuttingDown),
                }
            }
        }
    }

    /// Number of references currently queued or running
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    /// Close the queue and wait for the workers to drain it
    pub async fn shutdown(self) {
        drop(self.tx);
        for handle in self.workers {
            if let Err(e) = handle.await {
                warn!(error = %e, "worker task aborted");
            }
        }
        info!("dispatcher shut down");
    }

    fn clear_in_flight(&self, reference: &str) {
        self.in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(reference);
    }
}

async fn worker_loop(
    worker_id: usize,
    pipeline: Arc<JobPipeline>,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>>,
    in_flight: Arc<Mutex<HashSet<String>>>,
) {
    debug!(worker_id, "worker started");
    loop {
        // Hold the receiver lock only for the dequeue, not for the run.
        let event = { rx.lock().await.recv().await };

        let Some(event) = event else {
            debug!(worker_id, "queue closed, worker exiting");
            break;
        };

        let reference = event.content_reference.clone();
        let report = pipeline.run(event).await;
        debug!(
            worker_id,
            job_id = %report.job_id,
            outcome = report.outcome,
            "worker finished job"
        );

        in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&reference);
    }
}
