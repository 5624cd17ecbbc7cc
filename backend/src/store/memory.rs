//! In-memory [`FileIndexStore`] implementation
//!
//! Backs tests and `STORE_BACKEND=memory` runs. Records live in a `BTreeMap`
//! behind `std::sync::RwLock`, so iteration is already in id order.
//! Ids start at 1 and are never reused.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::models::{FileIndexId, FileIndexRecord, NewFileIndexRecord, Page, PageRequest};

use super::FileIndexStore;

/// In-memory store for tests and throwaway runs
pub struct InMemoryFileIndexStore {
    records: RwLock<BTreeMap<FileIndexId, FileIndexRecord>>,
    next_id: AtomicI64,
}

impl InMemoryFileIndexStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn filtered<F>(&self, predicate: F) -> Result<Vec<FileIndexRecord>>
    where
        F: Fn(&FileIndexRecord) -> bool,
    {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("files index lock poisoned"))?;
        Ok(records.values().filter(|r| predicate(r)).cloned().collect())
    }

    fn paged<F>(&self, page: &PageRequest, predicate: F) -> Result<Page<FileIndexRecord>>
    where
        F: Fn(&FileIndexRecord) -> bool,
    {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("files index lock poisoned"))?;
        let matching = records.values().filter(|r| predicate(r));
        let total = matching.clone().count() as i64;
        let content = matching
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.size()).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(Page::new(content, total, *page))
    }
}

impl Default for InMemoryFileIndexStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileIndexStore for InMemoryFileIndexStore {
    async fn find_all(&self, page: &PageRequest) -> Result<Page<FileIndexRecord>> {
        self.paged(page, |_| true)
    }

    async fn find_by_file_path(
        &self,
        path_fragment: &str,
        page: &PageRequest,
    ) -> Result<Page<FileIndexRecord>> {
        self.paged(page, |r| r.file_path.contains(path_fragment))
    }

    async fn find_by_kpi(&self, kpi: &str, page: &PageRequest) -> Result<Page<FileIndexRecord>> {
        self.paged(page, |r| r.kpi == kpi)
    }

    async fn find_by_kpi_and_file_path(
        &self,
        kpi: &str,
        path_fragment: &str,
        page: &PageRequest,
    ) -> Result<Page<FileIndexRecord>> {
        self.paged(page, |r| r.kpi == kpi && r.file_path.contains(path_fragment))
    }

    async fn list_all(&self) -> Result<Vec<FileIndexRecord>> {
        self.filtered(|_| true)
    }

    async fn list_by_kpi(&self, kpi: &str) -> Result<Vec<FileIndexRecord>> {
        self.filtered(|r| r.kpi == kpi)
    }

    async fn find_by_id(&self, id: FileIndexId) -> Result<Option<FileIndexRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("files index lock poisoned"))?;
        Ok(records.get(&id).cloned())
    }

    async fn save(&self, record: &NewFileIndexRecord) -> Result<FileIndexRecord> {
        record.validate()?;
        let (kpi, file_path) = record
            .required_fields()
            .context("validated record is missing kpi or filePath")?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let saved = FileIndexRecord {
            id,
            kpi: kpi.to_string(),
            file_path: file_path.to_string(),
            uploaded_by: record.uploaded_by.clone(),
            uploaded_at: record.uploaded_at,
        };

        self.records
            .write()
            .map_err(|_| anyhow!("files index lock poisoned"))?
            .insert(id, saved.clone());

        debug!(id, kpi = %saved.kpi, "Saved file index in memory");
        Ok(saved)
    }

    async fn delete(&self, id: FileIndexId) -> Result<()> {
        let removed = self
            .records
            .write()
            .map_err(|_| anyhow!("files index lock poisoned"))?
            .remove(&id);
        debug!(id, existed = removed.is_some(), "Deleted file index from memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    async fn seeded() -> InMemoryFileIndexStore {
        let store = InMemoryFileIndexStore::new();
        for (kpi, path) in [
            ("sales", "/data/sales/2024-01.txt"),
            ("sales", "/data/sales/2024-02.txt"),
            ("churn", "/data/churn/2024-01.txt"),
            ("churn", "/archive/churn/old.txt"),
        ] {
            store
                .save(&NewFileIndexRecord::new(kpi, path))
                .await
                .expect("save should succeed");
        }
        store
    }

    #[tokio::test]
    async fn test_save_assigns_increasing_ids() {
        let store = InMemoryFileIndexStore::new();
        let a = store.save(&NewFileIndexRecord::new("k", "/a")).await.unwrap();
        let b = store.save(&NewFileIndexRecord::new("k", "/a")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = InMemoryFileIndexStore::new();
        let a = store.save(&NewFileIndexRecord::new("k", "/a")).await.unwrap();
        store.delete(a.id).await.unwrap();
        let b = store.save(&NewFileIndexRecord::new("k", "/b")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_save_rejects_missing_fields() {
        let store = InMemoryFileIndexStore::new();
        let err = store.save(&NewFileIndexRecord::default()).await.unwrap_err();
        assert!(matches!(
            AppError::from(err),
            AppError::Validation(msg) if msg.contains("filePath")
        ));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_queries() {
        let store = seeded().await;
        let page = PageRequest::default();

        let by_path = store.find_by_file_path("2024-01", &page).await.unwrap();
        assert_eq!(by_path.total_elements, 2);

        let by_kpi = store.find_by_kpi("churn", &page).await.unwrap();
        assert_eq!(by_kpi.total_elements, 2);

        let both = store
            .find_by_kpi_and_file_path("churn", "2024-01", &page)
            .await
            .unwrap();
        assert_eq!(both.total_elements, 1);
        assert_eq!(both.content[0].file_path, "/data/churn/2024-01.txt");

        assert_eq!(store.list_by_kpi("sales").await.unwrap().len(), 2);
        assert!(store.list_by_kpi("Sales").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pagination_slices() {
        let store = seeded().await;
        let second = store
            .find_all(&PageRequest::new(1, 3).unwrap())
            .await
            .unwrap();
        assert_eq!(second.total_elements, 4);
        assert_eq!(second.content.len(), 1);
        assert_eq!(second.content[0].id, 4);

        let beyond = store
            .find_all(&PageRequest::new(5, 3).unwrap())
            .await
            .unwrap();
        assert!(beyond.content.is_empty());
        assert_eq!(beyond.total_elements, 4);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = seeded().await;
        assert!(store.delete(999).await.is_ok());
        assert_eq!(store.list_all().await.unwrap().len(), 4);
    }
}
