//! JSON-lines file implementation of the URL repository.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::MemoryUrlRepository;
use crate::domain::delete_request::DeleteBatch;
use crate::domain::entities::UrlRecord;
use crate::domain::repositories::{StorageError, UrlRepository};

/// Repository that keeps records in memory and mirrors them to a file.
///
/// The file holds one JSON-encoded [`UrlRecord`] per line. New records are
/// appended; a bulk delete rewrites the whole file so the deleted flags are
/// durable. Writers are serialised so the file always matches memory.
pub struct FileUrlRepository {
    path: PathBuf,
    records: MemoryUrlRepository,
    file: Mutex<()>,
}

impl FileUrlRepository {
    /// Opens `path`, loading every record already stored there.
    ///
    /// A missing file is treated as empty and created on the first write.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Io`] if the file exists but cannot be read
    /// - [`StorageError::Corrupt`] if a line is not a valid record
    /// - [`StorageError::DuplicateShortId`] if two lines share a short id
    /// - [`StorageError::DuplicateOriginalUrl`] if two live lines share a URL
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let records = load(&path).await?;
        let count = records.len();

        let repository = Self {
            records: MemoryUrlRepository::from_records(records)?,
            path,
            file: Mutex::new(()),
        };

        info!(path = %repository.path.display(), records = count, "File storage loaded");
        Ok(repository)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, record: &UrlRecord) -> Result<(), StorageError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    /// Replaces the file with the current contents through a temporary file.
    async fn rewrite(&self) -> Result<(), StorageError> {
        let mut buf = Vec::new();
        for record in self.records.snapshot() {
            serde_json::to_writer(&mut buf, &record)?;
            buf.push(b'\n');
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &buf).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), bytes = buf.len(), "Storage file rewritten");
        Ok(())
    }
}

async fn load(path: &Path) -> Result<Vec<UrlRecord>, StorageError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| StorageError::Corrupt {
                line: idx + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl UrlRepository for FileUrlRepository {
    async fn save(&self, record: UrlRecord) -> Result<(), StorageError> {
        let _file = self.file.lock().await;

        let short_id = record.short_id.clone();
        self.records.save(record.clone()).await?;

        if let Err(e) = self.append(&record).await {
            self.records.discard_last(&short_id);
            return Err(e);
        }
        Ok(())
    }

    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<UrlRecord>, StorageError> {
        self.records.find_by_short_id(short_id).await
    }

    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<UrlRecord>, StorageError> {
        self.records.find_by_original_url(original_url).await
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<UrlRecord>, StorageError> {
        self.records.find_by_owner(owner_id).await
    }

    async fn bulk_delete(&self, batch: &DeleteBatch) -> Result<(), StorageError> {
        let _file = self.file.lock().await;
        self.records.bulk_delete(batch).await?;
        self.rewrite().await
    }

    async fn persist(&self) -> Result<(), StorageError> {
        let _file = self.file.lock().await;
        self.rewrite().await?;
        info!(path = %self.path.display(), records = self.records.len(), "File storage persisted");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::metadata(dir).await?;
            }
            _ => {}
        }
        Ok(())
    }
}
