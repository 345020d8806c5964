//! Asynchronous audit delivery.
//!
//! Request handlers publish an [`AuditEvent`](crate::domain::audit_event::AuditEvent)
//! after a successful shorten or follow. [`AuditDispatcher`] hands each event to
//! every configured sink from a single background task, so handlers never wait
//! on network or disk I/O.
//!
//! # Sinks
//!
//! - [`HttpSink`] - enabled by `AUDIT_URL`, POSTs each event as JSON
//! - [`FileSink`] - enabled by `AUDIT_FILE`, appends each event as a JSON line
//!
//! Overload is handled by dropping: both the dispatcher mailbox and the HTTP
//! sink queue are bounded and discard new events when full.

pub mod dispatcher;
pub mod file_sink;
pub mod http_sink;
pub mod sink;

pub use dispatcher::AuditDispatcher;
pub use file_sink::FileSink;
pub use http_sink::{HttpSink, HttpSinkConfig};
pub use sink::{AuditError, AuditSink};

use std::path::PathBuf;
use std::time::Duration;

/// Audit settings taken from [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub url: Option<String>,
    pub file: Option<PathBuf>,
    pub queue_capacity: usize,
    pub http_workers: usize,
    pub http_timeout: Duration,
}

/// Builds the sinks enabled by `config`, HTTP first, then file.
///
/// Returns an empty list when neither `url` nor `file` is set.
///
/// # Errors
///
/// Returns [`AuditError::Http`] if the HTTP client cannot be built.
pub fn init_sinks(config: &AuditConfig) -> Result<Vec<Box<dyn AuditSink>>, AuditError> {
    let mut sinks: Vec<Box<dyn AuditSink>> = Vec::with_capacity(2);

    if let Some(url) = &config.url {
        sinks.push(Box::new(HttpSink::start(HttpSinkConfig {
            endpoint: url.clone(),
            workers: config.http_workers,
            queue_capacity: config.queue_capacity,
            request_timeout: config.http_timeout,
        })?));
    }

    if let Some(path) = &config.file {
        sinks.push(Box::new(FileSink::new(path.clone())));
    }

    Ok(sinks)
}
