//! Audit sink that POSTs events to a remote collector.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::sink::{AuditError, AuditSink};
use crate::domain::audit_event::AuditEvent;

type SharedQueue = Arc<tokio::sync::Mutex<mpsc::Receiver<AuditEvent>>>;

/// Settings for [`HttpSink`].
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    pub endpoint: String,
    pub workers: usize,
    pub queue_capacity: usize,
    pub request_timeout: Duration,
}

/// Delivers audit events as JSON `POST` requests through a worker pool.
///
/// [`accept`](AuditSink::accept) only enqueues; a fixed number of workers take
/// turns on the queue and perform one request per event. The queue is bounded
/// and drops new events when full, so a slow collector cannot grow memory.
/// Failed requests (network errors, timeouts, non-2xx answers) are logged and
/// not retried.
pub struct HttpSink {
    endpoint: String,
    queue: RwLock<Option<mpsc::Sender<AuditEvent>>>,
    workers: Mutex<Option<JoinSet<()>>>,
    dropped: AtomicU64,
}

impl HttpSink {
    /// Builds the HTTP client and starts the worker pool.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Http`] if the HTTP client cannot be built.
    pub fn start(config: HttpSinkConfig) -> Result<Self, AuditError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let queue: SharedQueue = Arc::new(tokio::sync::Mutex::new(rx));

        let mut workers = JoinSet::new();
        for worker_id in 0..config.workers {
            workers.spawn(run_worker(
                worker_id,
                queue.clone(),
                client.clone(),
                config.endpoint.clone(),
            ));
        }

        info!(
            endpoint = %config.endpoint,
            workers = config.workers,
            "Audit HTTP sink started"
        );

        Ok(Self {
            endpoint: config.endpoint,
            queue: RwLock::new(Some(tx)),
            workers: Mutex::new(Some(workers)),
            dropped: AtomicU64::new(0),
        })
    }

    /// Number of events dropped because the queue was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AuditSink for HttpSink {
    fn name(&self) -> &'static str {
        "audit_http"
    }

    async fn accept(&self, event: &AuditEvent) {
        let queue = self.queue.read().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = queue.as_ref() else {
            debug!("Audit HTTP sink closed, event discarded");
            return;
        };

        match tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("audit_events_dropped_total", "stage" => "audit_http")
                    .increment(1);
                warn!(
                    endpoint = %self.endpoint,
                    action = ?event.action,
                    url = %event.url,
                    "Dropping audit event (queue full)"
                );
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Audit HTTP workers are gone, event discarded");
            }
        }
    }

    async fn shutdown(&self, timeout: Duration) -> Result<(), AuditError> {
        drop(
            self.queue
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let workers = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(mut workers) = workers else {
            return Ok(());
        };

        let drained = tokio::time::timeout(timeout, async {
            while let Some(result) = workers.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "Audit HTTP worker failed");
                }
            }
        })
        .await;

        if drained.is_err() {
            let pending = workers.len();
            // Requests in flight finish or time out on their own.
            workers.detach_all();
            return Err(AuditError::ShutdownTimeout {
                sink: self.name(),
                pending,
            });
        }

        info!("Audit HTTP sink closed");
        Ok(())
    }
}

async fn run_worker(
    worker_id: usize,
    queue: SharedQueue,
    client: reqwest::Client,
    endpoint: String,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(event) = next else {
            break;
        };

        if let Err(e) = send(&client, &endpoint, &event).await {
            warn!(worker_id, endpoint = %endpoint, error = %e, "Failed to deliver audit event");
        }
    }

    debug!(worker_id, "Audit HTTP worker stopped");
}

async fn send(client: &reqwest::Client, endpoint: &str, event: &AuditEvent) -> Result<(), AuditError> {
    client
        .post(endpoint)
        .json(event)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
