//! Audit sink that appends JSON lines to a local file.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::sink::{AuditError, AuditSink};
use crate::domain::audit_event::AuditEvent;

/// Appends one JSON line per audit event to a file.
///
/// Every event is written under an exclusive lock: the file is opened in
/// append mode (created if missing), the full line is written and flushed, and
/// the handle is closed again. Records therefore never interleave and each
/// line is complete on disk once `accept` returns.
pub struct FileSink {
    target: Mutex<Option<PathBuf>>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!(path = %path.display(), "Audit file sink ready");
        Self {
            target: Mutex::new(Some(path)),
        }
    }
}

#[async_trait]
impl AuditSink for FileSink {
    fn name(&self) -> &'static str {
        "audit_file"
    }

    async fn accept(&self, event: &AuditEvent) {
        let mut line = match event.to_json() {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Failed to encode audit event");
                return;
            }
        };
        line.push(b'\n');

        let target = self.target.lock().await;
        let Some(path) = target.as_deref() else {
            debug!("Audit file sink closed, event discarded");
            return;
        };

        if let Err(e) = append_line(path, &line).await {
            error!(path = %path.display(), error = %e, "Failed to write audit event");
        }
    }

    async fn shutdown(&self, _timeout: Duration) -> Result<(), AuditError> {
        if self.target.lock().await.take().is_some() {
            info!("Audit file sink closed");
        }
        Ok(())
    }
}

async fn append_line(path: &Path, line: &[u8]) -> Result<(), AuditError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line).await?;
    file.flush().await?;
    Ok(())
}
