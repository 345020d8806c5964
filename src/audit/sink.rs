//! Sink trait and error types.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::audit_event::AuditEvent;

/// Errors that can occur while delivering or shutting down audit sinks.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Failed to encode audit event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Audit file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audit HTTP delivery failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Audit sink `{sink}` did not stop in time, {pending} worker(s) abandoned")]
    ShutdownTimeout { sink: &'static str, pending: usize },
}

/// A pluggable destination for audit events.
///
/// Sinks are registered once when [`crate::audit::AuditDispatcher`] is built
/// and are owned by it from then on, including their shutdown.
///
/// # Contract
///
/// - [`accept`](AuditSink::accept) is awaited by the single dispatch task for
///   every event, so it must return quickly: either hand the event to an
///   internal queue (dropping it when the queue is full) or do one short,
///   serialised write. Delivery failures are logged by the sink, never
///   returned.
/// - [`shutdown`](AuditSink::shutdown) drains in-flight work and must return
///   within `timeout`. Work still running after that is abandoned.
///
/// # Implementations
///
/// - [`crate::audit::HttpSink`] - POSTs each event through a worker pool
/// - [`crate::audit::FileSink`] - appends one JSON line per event
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Short stable identifier used in logs.
    fn name(&self) -> &'static str;

    /// Takes one event for delivery.
    async fn accept(&self, event: &AuditEvent);

    /// Stops the sink, waiting at most `timeout` for pending deliveries.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::ShutdownTimeout`] if pending work was abandoned.
    async fn shutdown(&self, timeout: Duration) -> Result<(), AuditError>;
}
