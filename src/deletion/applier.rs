//! Applies merged delete batches to storage.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::domain::delete_request::DeleteBatch;
use crate::domain::repositories::UrlRepository;

/// Summary of an applier run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Batches storage accepted.
    pub batches: usize,
    /// Requests contained in the accepted batches.
    pub items: usize,
    /// `true` if the run stopped on a storage error.
    pub halted: bool,
}

/// Hands each batch to [`UrlRepository::bulk_delete`] in arrival order.
///
/// Returns once the batch stream closes, or after the first storage error.
/// On error the receiver is dropped, which makes every upstream stage fail
/// its next send and wind down; the remaining queued work is discarded.
pub async fn run_applier(
    mut batches: mpsc::Receiver<DeleteBatch>,
    repository: Arc<dyn UrlRepository>,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    while let Some(batch) = batches.recv().await {
        let size = batch.len();

        if let Err(e) = repository.bulk_delete(&batch).await {
            error!(size, error = %e, "Failed to apply delete batch, stopping deletion pipeline");
            report.halted = true;
            break;
        }

        metrics::counter!("delete_batches_applied_total").increment(1);
        debug!(size, "Delete batch applied");
        report.batches += 1;
        report.items += size;
    }

    info!(
        batches = report.batches,
        items = report.items,
        halted = report.halted,
        "Delete applier finished"
    );
    report
}
