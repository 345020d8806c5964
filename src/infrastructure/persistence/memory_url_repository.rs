//! In-memory implementation of the URL repository.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use crate::domain::delete_request::DeleteBatch;
use crate::domain::entities::UrlRecord;
use crate::domain::repositories::{StorageError, UrlRepository};

#[derive(Debug, Default)]
struct Records {
    /// Insertion order.
    rows: Vec<UrlRecord>,
    by_short_id: HashMap<String, usize>,
    /// Live records only.
    by_original_url: HashMap<String, usize>,
}

impl Records {
    fn insert(&mut self, record: UrlRecord) -> Result<(), StorageError> {
        if self.by_short_id.contains_key(&record.short_id) {
            return Err(StorageError::DuplicateShortId(record.short_id));
        }
        if !record.is_deleted
            && let Some(&existing) = self.by_original_url.get(&record.original_url)
        {
            return Err(StorageError::DuplicateOriginalUrl {
                short_id: self.rows[existing].short_id.clone(),
            });
        }
        let idx = self.rows.len();
        self.by_short_id.insert(record.short_id.clone(), idx);
        if !record.is_deleted {
            self.by_original_url.insert(record.original_url.clone(), idx);
        }
        self.rows.push(record);
        Ok(())
    }
}

/// Process-local repository indexed by short id and by original URL.
///
/// At most one live record exists per original URL; a second save of the
/// same URL fails with [`StorageError::DuplicateOriginalUrl`].
///
/// Contents are lost on restart; [`FileUrlRepository`](super::FileUrlRepository)
/// adds durability on top of it.
#[derive(Debug, Default)]
pub struct MemoryUrlRepository {
    records: RwLock<Records>,
}

impl MemoryUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository pre-filled with `records`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DuplicateShortId`] if two records share a short id
    /// and [`StorageError::DuplicateOriginalUrl`] if two live records share a URL.
    pub fn from_records(records: impl IntoIterator<Item = UrlRecord>) -> Result<Self, StorageError> {
        let mut loaded = Records::default();
        for record in records {
            loaded.insert(record)?;
        }
        Ok(Self {
            records: RwLock::new(loaded),
        })
    }

    /// Copy of every stored record, deleted ones included, in insertion order.
    pub fn snapshot(&self) -> Vec<UrlRecord> {
        self.read().rows.clone()
    }

    pub fn len(&self) -> usize {
        self.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes the most recently saved record if it has `short_id`.
    ///
    /// Used to roll back a save whose durable write failed.
    pub(crate) fn discard_last(&self, short_id: &str) {
        let mut records = self.write();
        if records.rows.last().is_some_and(|r| r.short_id == short_id) {
            let idx = records.rows.len() - 1;
            if let Some(record) = records.rows.pop() {
                records.by_short_id.remove(short_id);
                if records.by_original_url.get(&record.original_url) == Some(&idx) {
                    records.by_original_url.remove(&record.original_url);
                }
            }
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Records> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Records> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UrlRepository for MemoryUrlRepository {
    async fn save(&self, record: UrlRecord) -> Result<(), StorageError> {
        self.write().insert(record)
    }

    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<UrlRecord>, StorageError> {
        let records = self.read();
        Ok(records
            .by_short_id
            .get(short_id)
            .map(|&idx| records.rows[idx].clone()))
    }

    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<UrlRecord>, StorageError> {
        let records = self.read();
        Ok(records
            .by_original_url
            .get(original_url)
            .map(|&idx| records.rows[idx].clone()))
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<UrlRecord>, StorageError> {
        Ok(self
            .read()
            .rows
            .iter()
            .filter(|r| r.owner_id == owner_id && !r.is_deleted)
            .cloned()
            .collect())
    }

    async fn bulk_delete(&self, batch: &DeleteBatch) -> Result<(), StorageError> {
        if batch.is_empty() {
            return Ok(());
        }

        let wanted: HashSet<(&str, &str)> = batch
            .iter()
            .map(|r| (r.item_id.as_str(), r.owner_id.as_str()))
            .collect();

        let mut guard = self.write();
        let records = &mut *guard;
        for (idx, row) in records.rows.iter_mut().enumerate() {
            if row.is_deleted || !wanted.contains(&(row.short_id.as_str(), row.owner_id.as_str())) {
                continue;
            }
            row.is_deleted = true;
            if records.by_original_url.get(&row.original_url) == Some(&idx) {
                records.by_original_url.remove(&row.original_url);
            }
        }
        Ok(())
    }

    async fn persist(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::delete_request::DeleteRequest;

    async fn seeded() -> MemoryUrlRepository {
        let repo = MemoryUrlRepository::new();
        repo.save(UrlRecord::new("aaa", "https://a.com", "alice"))
            .await
            .unwrap();
        repo.save(UrlRecord::new("bbb", "https://b.com", "alice"))
            .await
            .unwrap();
        repo.save(UrlRecord::new("ccc", "https://c.com", "bob"))
            .await
            .unwrap();
        repo
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_short_id() {
        let repo = seeded().await;

        let result = repo
            .save(UrlRecord::new("aaa", "https://other.com", "bob"))
            .await;

        assert!(matches!(result, Err(StorageError::DuplicateShortId(id)) if id == "aaa"));
        assert_eq!(repo.len(), 3);
    }

    #[tokio::test]
    async fn test_save_rejects_second_live_record_for_same_url() {
        let repo = seeded().await;

        let result = repo
            .save(UrlRecord::new("ddd", "https://a.com", "bob"))
            .await;

        assert!(
            matches!(result, Err(StorageError::DuplicateOriginalUrl { short_id }) if short_id == "aaa")
        );
        assert_eq!(repo.len(), 3);
    }

    #[tokio::test]
    async fn test_deleted_url_can_be_shortened_again() {
        let repo = seeded().await;
        let batch: DeleteBatch = vec![DeleteRequest::new("alice", "aaa")].into();
        repo.bulk_delete(&batch).await.unwrap();

        repo.save(UrlRecord::new("ddd", "https://a.com", "bob"))
            .await
            .unwrap();

        let live = repo
            .find_by_original_url("https://a.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(live.short_id, "ddd");
    }

    #[tokio::test]
    async fn test_find_by_short_id_and_original_url() {
        let repo = seeded().await;

        let by_id = repo.find_by_short_id("bbb").await.unwrap().unwrap();
        assert_eq!(by_id.original_url, "https://b.com");

        let by_url = repo
            .find_by_original_url("https://c.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_url.short_id, "ccc");

        assert!(repo.find_by_short_id("zzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_owner_keeps_insertion_order() {
        let repo = seeded().await;

        let ids: Vec<String> = repo
            .find_by_owner("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.short_id)
            .collect();

        assert_eq!(ids, vec!["aaa", "bbb"]);
    }

    #[tokio::test]
    async fn test_bulk_delete_only_touches_owned_records() {
        let repo = seeded().await;
        let batch: DeleteBatch = vec![
            DeleteRequest::new("alice", "aaa"),
            DeleteRequest::new("alice", "ccc"),
            DeleteRequest::new("alice", "missing"),
        ]
        .into();

        repo.bulk_delete(&batch).await.unwrap();

        assert!(repo.find_by_short_id("aaa").await.unwrap().unwrap().is_deleted);
        assert!(!repo.find_by_short_id("ccc").await.unwrap().unwrap().is_deleted);
        assert_eq!(repo.find_by_owner("alice").await.unwrap().len(), 1);
        assert!(
            repo.find_by_original_url("https://a.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_discard_last_rolls_back_latest_save() {
        let repo = seeded().await;

        repo.discard_last("aaa");
        assert_eq!(repo.len(), 3);

        repo.discard_last("ccc");
        assert_eq!(repo.len(), 2);
        assert!(repo.find_by_short_id("ccc").await.unwrap().is_none());
    }

    #[test]
    fn test_from_records_rejects_duplicates() {
        let result = MemoryUrlRepository::from_records(vec![
            UrlRecord::new("x", "https://1.com", "u"),
            UrlRecord::new("x", "https://2.com", "u"),
        ]);

        assert!(result.is_err());
    }
}
