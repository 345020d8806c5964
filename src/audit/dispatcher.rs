//! Fire-and-forget audit event dispatcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::sink::AuditSink;
use crate::domain::audit_event::AuditEvent;

type Sinks = Arc<[Box<dyn AuditSink>]>;

struct DispatchTask {
    handle: JoinHandle<()>,
    stop: CancellationToken,
}

/// Fans audit events out to a fixed set of sinks without blocking producers.
///
/// Owns one bounded mailbox and one dispatch task. The task takes events in
/// publish order and awaits [`AuditSink::accept`] on every sink in
/// registration order, so each sink sees events in the order they were
/// published.
///
/// # Delivery Guarantees
///
/// - At most once per sink: an event is never forwarded twice
/// - Drop-on-full: when the mailbox is at capacity the new event is dropped,
///   logged and counted; [`publish`](Self::publish) never waits
/// - With no sinks registered nothing is allocated and publishing is a no-op
///
/// # Usage
///
/// ```rust,ignore
/// let dispatcher = AuditDispatcher::new(audit::init_sinks(&config)?, config.queue_capacity);
/// dispatcher.publish(AuditEvent::follow(None, "https://example.com"));
/// dispatcher.shutdown(Duration::from_secs(10)).await;
/// ```
pub struct AuditDispatcher {
    mailbox: RwLock<Option<mpsc::Sender<AuditEvent>>>,
    task: Mutex<Option<DispatchTask>>,
    sinks: Sinks,
    dropped: AtomicU64,
}

impl AuditDispatcher {
    /// Registers `sinks` and starts the dispatch task.
    ///
    /// Must be called from within a Tokio runtime when `sinks` is non-empty.
    pub fn new(sinks: Vec<Box<dyn AuditSink>>, capacity: usize) -> Self {
        let sinks: Sinks = sinks.into();

        if sinks.is_empty() {
            info!("No audit sinks configured, audit dispatch disabled");
            return Self {
                mailbox: RwLock::new(None),
                task: Mutex::new(None),
                sinks,
                dropped: AtomicU64::new(0),
            };
        }

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let stop = CancellationToken::new();
        let handle = tokio::spawn(dispatch(rx, sinks.clone(), stop.clone()));

        info!(
            sinks = ?sinks.iter().map(|s| s.name()).collect::<Vec<_>>(),
            capacity,
            "Audit dispatcher started"
        );

        Self {
            mailbox: RwLock::new(Some(tx)),
            task: Mutex::new(Some(DispatchTask { handle, stop })),
            sinks,
            dropped: AtomicU64::new(0),
        }
    }

    /// Returns true if at least one sink is registered.
    pub fn is_enabled(&self) -> bool {
        !self.sinks.is_empty()
    }

    /// Number of events dropped because the mailbox was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Queues `event` for delivery to every sink.
    ///
    /// Never blocks and never fails. A full mailbox drops the event with a
    /// warning; after [`shutdown`](Self::shutdown) events are discarded.
    pub fn publish(&self, event: AuditEvent) {
        let mailbox = self.mailbox.read().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = mailbox.as_ref() else {
            return;
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("audit_events_dropped_total", "stage" => "dispatcher")
                    .increment(1);
                warn!(
                    action = ?event.action,
                    url = %event.url,
                    "Dropping audit event (mailbox full)"
                );
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Audit dispatch task is gone, event discarded");
            }
        }
    }

    /// Stops accepting events, drains the mailbox and shuts every sink down.
    ///
    /// Waits for queued events to be forwarded until `timeout` elapses, then
    /// gives each sink whatever is left of the same budget. Events still
    /// queued at the deadline are abandoned. Sink shutdown errors are logged.
    /// Calling this more than once has no further effect.
    pub async fn shutdown(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;

        let sender = self
            .mailbox
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(DispatchTask { handle, stop }) = task else {
            return;
        };

        info!("Closing audit dispatcher");
        drop(sender);

        match tokio::time::timeout_at(deadline, handle).await {
            Ok(Ok(())) => debug!("Audit mailbox drained"),
            Ok(Err(e)) => error!(error = %e, "Audit dispatch task failed"),
            Err(_) => {
                stop.cancel();
                warn!("Shutdown deadline elapsed, abandoning undelivered audit events");
            }
        }

        for sink in self.sinks.iter() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if let Err(e) = sink.shutdown(remaining).await {
                error!(sink = sink.name(), error = %e, "Failed to shut down audit sink");
            }
        }

        info!("Audit dispatcher closed");
    }
}

/// Forwards mailbox events to every sink until the mailbox closes or `stop`
/// fires. `stop` is only observed between events, so a forward in progress
/// is never interrupted.
async fn dispatch(mut rx: mpsc::Receiver<AuditEvent>, sinks: Sinks, stop: CancellationToken) {
    let mut forwarded: u64 = 0;

    loop {
        let event = tokio::select! {
            biased;
            () = stop.cancelled() => {
                warn!(remaining = rx.len(), "Audit dispatch stopped before mailbox drained");
                break;
            }
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        for sink in sinks.iter() {
            sink.accept(&event).await;
        }
        forwarded += 1;
    }

    info!(forwarded, "Audit dispatch finished");
}
