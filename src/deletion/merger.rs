//! Fan-in of accumulator outputs into a single batch stream.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::delete_request::DeleteBatch;

/// Merges several batch streams into one.
///
/// Spawns one forwarding task per source. Each forwarder owns a clone of the
/// merged sender, so the sender's reference count is the completion barrier:
/// the merged stream closes exactly when the last forwarder finishes, i.e.
/// after every source is exhausted.
///
/// Each batch is forwarded once. A forwarder cancelled while the merged
/// stream is full drops the batch it holds and stops.
pub fn merge(
    sources: Vec<mpsc::Receiver<DeleteBatch>>,
    cancel: CancellationToken,
) -> mpsc::Receiver<DeleteBatch> {
    let (merged_tx, merged_rx) = mpsc::channel(1);

    for (source_id, source) in sources.into_iter().enumerate() {
        tokio::spawn(forward(source_id, source, merged_tx.clone(), cancel.clone()));
    }

    merged_rx
}

async fn forward(
    source_id: usize,
    mut source: mpsc::Receiver<DeleteBatch>,
    merged: mpsc::Sender<DeleteBatch>,
    cancel: CancellationToken,
) {
    while let Some(batch) = source.recv().await {
        let size = batch.len();

        tokio::select! {
            biased;
            sent = merged.send(batch) => {
                if sent.is_err() {
                    debug!(source_id, size, "Merged batch stream closed, forwarder stopping");
                    return;
                }
            }
            () = cancel.cancelled() => {
                metrics::counter!("delete_batches_abandoned_total").increment(1);
                warn!(source_id, size, "Delete batch abandoned on cancellation");
                return;
            }
        }
    }

    debug!(source_id, "Batch source exhausted");
}
