//! Batched deletion pipeline.
//!
//! Bulk-delete requests are split into [`DeleteRequest`]s and pushed into one
//! bounded input queue. Several accumulators drain that queue in parallel and
//! emit size/time bounded batches, the merger joins their outputs, and a
//! single applier hands each batch to storage.
//!
//! ```text
//! submit ─► input ─┬─► accumulator 0 ─┐
//!                  ├─► accumulator 1 ─┼─► merger ─► applier ─► bulk_delete
//!                  └─► accumulator N ─┘
//! ```
//!
//! One [`CancellationToken`] threads every stage. A storage failure stops the
//! applier, and the closed channels then stop everything upstream.

pub mod accumulator;
pub mod applier;
pub mod merger;

pub use accumulator::{SharedInput, shared_input, spawn_accumulator};
pub use applier::{ApplyReport, run_applier};
pub use merger::merge;

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::delete_request::DeleteRequest;
use crate::domain::repositories::UrlRepository;

/// How long [`DeletionPipeline::shutdown`] waits for the applier after cancelling.
pub(crate) const CANCEL_GRACE: Duration = Duration::from_millis(500);

/// Deletion pipeline settings taken from [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_batch_size: usize,
    pub flush_interval: Duration,
    pub accumulators: usize,
    pub queue_capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 50,
            flush_interval: Duration::from_secs(1),
            accumulators: std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1),
            queue_capacity: 1024,
        }
    }
}

/// Handle to a running deletion pipeline.
pub struct DeletionPipeline {
    input: RwLock<Option<mpsc::Sender<DeleteRequest>>>,
    applier: Mutex<Option<JoinHandle<ApplyReport>>>,
    cancel: CancellationToken,
}

impl DeletionPipeline {
    /// Spawns accumulators, merger and applier.
    ///
    /// Must be called from within a Tokio runtime. Cancelling `cancel` makes
    /// every stage flush what it holds (best effort) and exit.
    pub fn start(
        config: BatchConfig,
        repository: Arc<dyn UrlRepository>,
        cancel: CancellationToken,
    ) -> Self {
        let accumulators = config.accumulators.max(1);
        let (input_tx, input_rx) = mpsc::channel(config.queue_capacity.max(1));
        let input = shared_input(input_rx);

        let outputs = (0..accumulators)
            .map(|id| {
                spawn_accumulator(
                    id,
                    input.clone(),
                    config.max_batch_size,
                    config.flush_interval,
                    cancel.clone(),
                )
            })
            .collect();
        let merged = merge(outputs, cancel.clone());
        let applier = tokio::spawn(run_applier(merged, repository));

        info!(
            accumulators,
            max_batch_size = config.max_batch_size,
            flush_interval_ms = config.flush_interval.as_millis() as u64,
            "Deletion pipeline started"
        );

        Self {
            input: RwLock::new(Some(input_tx)),
            applier: Mutex::new(Some(applier)),
            cancel,
        }
    }

    /// `false` after [`shutdown`](Self::shutdown), once every accumulator has
    /// exited, or once the applier stopped on a storage error.
    pub fn is_running(&self) -> bool {
        let accepting = self
            .input
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed());

        accepting && !self.applier_finished()
    }

    fn applier_finished(&self) -> bool {
        self.applier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
    }

    /// Queues deletion of `item_ids` on behalf of `owner_id`.
    ///
    /// Returns immediately; a feeder task pushes the requests into the input
    /// queue, waiting for room as needed. Requests submitted after
    /// [`shutdown`](Self::shutdown) or after a storage failure halted the
    /// applier are discarded.
    pub fn submit(&self, owner_id: &str, item_ids: Vec<String>) {
        if item_ids.is_empty() {
            return;
        }

        if self.applier_finished() {
            warn!(owner_id, count = item_ids.len(), "Deletion pipeline halted, request discarded");
            return;
        }

        let input = self.input.read().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = input.as_ref() else {
            debug!(owner_id, count = item_ids.len(), "Deletion pipeline closed, request discarded");
            return;
        };

        tokio::spawn(feed(
            tx.clone(),
            owner_id.to_string(),
            item_ids,
            self.cancel.clone(),
        ));
    }

    /// Closes the input and waits for the applier to drain.
    ///
    /// When `timeout` elapses first the pipeline token is cancelled, the
    /// applier gets a short grace period for the final flushes, and the
    /// remaining work is abandoned. Returns the applier's report when it
    /// finished in time, `None` otherwise or on repeated calls.
    pub async fn shutdown(&self, timeout: Duration) -> Option<ApplyReport> {
        drop(self.input.write().unwrap_or_else(PoisonError::into_inner).take());
        let handle = self
            .applier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let mut handle = handle?;

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                warn!(error = %e, "Delete applier task failed");
                None
            }
            Err(_) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Deletion pipeline did not drain in time, cancelling"
                );
                self.cancel.cancel();

                // Final flushes may still reach storage; wait for them briefly
                // so callers can persist afterwards.
                match tokio::time::timeout(CANCEL_GRACE, &mut handle).await {
                    Ok(Ok(report)) => debug!(
                        batches = report.batches,
                        items = report.items,
                        "Delete applier stopped after cancellation"
                    ),
                    Ok(Err(e)) => warn!(error = %e, "Delete applier task failed"),
                    Err(_) => {
                        warn!("Delete applier still busy after cancellation, abandoning");
                        handle.abort();
                    }
                }
                None
            }
        }
    }
}

async fn feed(
    input: mpsc::Sender<DeleteRequest>,
    owner_id: String,
    item_ids: Vec<String>,
    cancel: CancellationToken,
) {
    let total = item_ids.len();

    for (sent, item_id) in item_ids.into_iter().enumerate() {
        let request = DeleteRequest::new(owner_id.as_str(), item_id);
        tokio::select! {
            biased;
            result = input.send(request) => {
                if result.is_err() {
                    warn!(owner_id = %owner_id, sent, total, "Deletion pipeline stopped, remaining requests dropped");
                    return;
                }
            }
            () = cancel.cancelled() => {
                warn!(owner_id = %owner_id, sent, total, "Deletion cancelled, remaining requests dropped");
                return;
            }
        }
    }

    debug!(owner_id = %owner_id, total, "Delete requests queued");
}
