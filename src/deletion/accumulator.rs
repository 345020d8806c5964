//! Size/time bounded batch accumulator.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::delete_request::{DeleteBatch, DeleteRequest};

/// Delete-request queue shared by every accumulator of a pipeline.
///
/// Accumulators take turns on the receiver, so each request is consumed by
/// exactly one of them.
pub type SharedInput = Arc<Mutex<mpsc::Receiver<DeleteRequest>>>;

/// Wraps a receiver so several accumulators can drain it.
pub fn shared_input(rx: mpsc::Receiver<DeleteRequest>) -> SharedInput {
    Arc::new(Mutex::new(rx))
}

/// Outcome of one flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flush {
    Empty,
    Emitted,
    /// Cancelled while the downstream was full; the batch is lost.
    Abandoned,
    /// Downstream receiver dropped; nothing more can be emitted.
    Disconnected,
}

/// Groups delete requests into batches by count or by age.
///
/// # Lifecycle
///
/// - **Open**: appends every received request to the current batch
/// - **Flushing**: emits the batch when it reaches `max_batch_size` or when
///   the flush timer ticks with a non-empty batch, then returns to Open
/// - **Closed**: after the input closes or the token is cancelled, one final
///   flush is attempted and the output channel is closed
///
/// Emission waits for room downstream. If the token is cancelled during that
/// wait the batch is abandoned.
struct BatchAccumulator {
    id: usize,
    batch: DeleteBatch,
    max_batch_size: usize,
    output: mpsc::Sender<DeleteBatch>,
    cancel: CancellationToken,
}

/// Spawns an accumulator reading from `input` and returns its batch stream.
///
/// The returned receiver yields non-empty batches of at most
/// `max_batch_size` requests and closes when the accumulator terminates.
pub fn spawn_accumulator(
    id: usize,
    input: SharedInput,
    max_batch_size: usize,
    flush_interval: Duration,
    cancel: CancellationToken,
) -> mpsc::Receiver<DeleteBatch> {
    let max_batch_size = max_batch_size.max(1);
    let (output, batches) = mpsc::channel(1);

    let accumulator = BatchAccumulator {
        id,
        batch: DeleteBatch::with_capacity(max_batch_size),
        max_batch_size,
        output,
        cancel,
    };
    tokio::spawn(accumulator.run(input, flush_interval));

    batches
}

impl BatchAccumulator {
    async fn run(mut self, input: SharedInput, flush_interval: Duration) {
        let mut ticker = tokio::time::interval_at(Instant::now() + flush_interval, flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    self.flush().await;
                    break;
                }
                request = next_request(&input) => match request {
                    Some(request) => {
                        self.batch.push(request);
                        if self.batch.len() >= self.max_batch_size
                            && self.flush().await == Flush::Disconnected
                        {
                            break;
                        }
                    }
                    None => {
                        self.flush().await;
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if self.flush().await == Flush::Disconnected {
                        break;
                    }
                }
            }
        }

        debug!(accumulator = self.id, "Batch accumulator closed");
    }

    async fn flush(&mut self) -> Flush {
        if self.batch.is_empty() {
            return Flush::Empty;
        }

        let batch = std::mem::replace(
            &mut self.batch,
            DeleteBatch::with_capacity(self.max_batch_size),
        );
        let size = batch.len();

        tokio::select! {
            biased;
            sent = self.output.send(batch) => match sent {
                Ok(()) => {
                    debug!(accumulator = self.id, size, "Delete batch emitted");
                    Flush::Emitted
                }
                Err(_) => {
                    warn!(accumulator = self.id, size, "Batch consumer is gone, dropping delete batch");
                    Flush::Disconnected
                }
            },
            () = self.cancel.cancelled() => {
                metrics::counter!("delete_batches_abandoned_total").increment(1);
                warn!(accumulator = self.id, size, "Delete batch abandoned on cancellation");
                Flush::Abandoned
            }
        }
    }
}

async fn next_request(input: &SharedInput) -> Option<DeleteRequest> {
    input.lock().await.recv().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(n: usize) -> DeleteRequest {
        DeleteRequest::new("owner", format!("id-{n}"))
    }

    async fn collect(mut batches: mpsc::Receiver<DeleteBatch>) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        while let Some(batch) = batches.recv().await {
            out.push(batch.iter().map(|r| r.item_id.clone()).collect());
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_flushes_full_batches_then_remainder_on_close() {
        let (tx, rx) = mpsc::channel(16);
        let batches = spawn_accumulator(
            0,
            shared_input(rx),
            3,
            Duration::from_secs(60),
            CancellationToken::new(),
        );

        for n in 0..7 {
            tx.send(request(n)).await.unwrap();
        }
        drop(tx);

        let batches = collect(batches).await;
        assert_eq!(
            batches,
            vec![
                vec!["id-0", "id-1", "id-2"],
                vec!["id-3", "id-4", "id-5"],
                vec!["id-6"],
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_batch_flushed_after_interval() {
        let (tx, rx) = mpsc::channel(16);
        let interval = Duration::from_secs(1);
        let mut batches =
            spawn_accumulator(0, shared_input(rx), 50, interval, CancellationToken::new());

        let started = Instant::now();
        tx.send(request(1)).await.unwrap();

        let batch = tokio::time::timeout(interval * 2, batches.recv())
            .await
            .expect("partial batch should be flushed by the timer")
            .unwrap();

        assert_eq!(batch.len(), 1);
        assert!(started.elapsed() >= interval);
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batches_are_never_emitted() {
        let (tx, rx) = mpsc::channel::<DeleteRequest>(16);
        let mut batches = spawn_accumulator(
            0,
            shared_input(rx),
            5,
            Duration::from_millis(100),
            CancellationToken::new(),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(batches.try_recv().is_err());

        drop(tx);
        assert!(batches.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_flushes_pending_batch_and_closes() {
        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let batches = spawn_accumulator(
            0,
            shared_input(rx),
            10,
            Duration::from_secs(60),
            cancel.clone(),
        );

        for n in 0..4 {
            tx.send(request(n)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        let batches = collect(batches).await;
        assert_eq!(batches, vec![vec!["id-0", "id-1", "id-2", "id-3"]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_abandons_blocked_emission() {
        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let batches = spawn_accumulator(
            0,
            shared_input(rx),
            1,
            Duration::from_secs(60),
            cancel.clone(),
        );

        for n in 0..3 {
            tx.send(request(n)).await.unwrap();
        }
        // First batch fills the output buffer, the second flush blocks.
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        let batches = collect(batches).await;
        assert_eq!(batches, vec![vec!["id-0"]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accumulators_share_input_without_duplicates() {
        let (tx, rx) = mpsc::channel(64);
        let input = shared_input(rx);
        let cancel = CancellationToken::new();
        let first = spawn_accumulator(0, input.clone(), 4, Duration::from_secs(1), cancel.clone());
        let second = spawn_accumulator(1, input, 4, Duration::from_secs(1), cancel);

        for n in 0..30 {
            tx.send(request(n)).await.unwrap();
        }
        drop(tx);

        let (a, b) = tokio::join!(collect(first), collect(second));
        let mut seen: Vec<String> = a.into_iter().chain(b).flatten().collect();
        seen.sort();
        seen.dedup();

        assert_eq!(seen.len(), 30);
    }
}
