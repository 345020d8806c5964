//! Repository trait for short URL storage.

use crate::domain::delete_request::DeleteBatch;
use crate::domain::entities::UrlRecord;
use async_trait::async_trait;

/// Errors raised by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Corrupt record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("Short id `{0}` already exists")]
    DuplicateShortId(String),

    #[error("URL is already shortened as `{short_id}`")]
    DuplicateOriginalUrl { short_id: String },
}

/// Repository interface for short URL mappings.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryUrlRepository`] - process-local map
/// - [`crate::infrastructure::persistence::FileUrlRepository`] - JSON-lines file on top of the map
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Stores a new mapping.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DuplicateShortId`] if the short id is taken and
    /// [`StorageError::DuplicateOriginalUrl`] if a live record already
    /// shortens the same URL.
    async fn save(&self, record: UrlRecord) -> Result<(), StorageError>;

    /// Finds a mapping by short id, including soft-deleted ones.
    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<UrlRecord>, StorageError>;

    /// Finds the mapping that already shortens `original_url`, if any.
    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<UrlRecord>, StorageError>;

    /// Lists live (not deleted) mappings owned by `owner_id`.
    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<UrlRecord>, StorageError>;

    /// Soft-deletes every record of the batch whose owner matches the request.
    ///
    /// Requests naming unknown ids or foreign records are ignored. The whole
    /// batch succeeds or fails as one call.
    async fn bulk_delete(&self, batch: &DeleteBatch) -> Result<(), StorageError>;

    /// Flushes the current state to durable storage, if the backend has any.
    async fn persist(&self) -> Result<(), StorageError>;

    /// Returns `Ok(())` if the backend is reachable.
    async fn ping(&self) -> Result<(), StorageError>;
}
