//! Files index service
//!
//! Dispatches list/search requests to the right store query, shapes the
//! pagination envelope, and reads indexed files for download.

use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::{FileIndexId, FileIndexRecord, NewFileIndexRecord, PageRequest, PageResult};
use crate::store::FileIndexStore;

/// Which store query a list request resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFilter<'a> {
    /// KPI and path fragment both given
    KpiAndFilePath {
        /// Exact KPI key
        kpi: &'a str,
        /// Path substring
        filter: &'a str,
    },
    /// Only a path fragment given
    FilePath(&'a str),
    /// Only a KPI given
    Kpi(&'a str),
    /// No filtering
    All,
}

impl<'a> SearchFilter<'a> {
    /// Resolve optional query parameters; empty strings count as absent
    pub fn resolve(filter: Option<&'a str>, kpi: Option<&'a str>) -> Self {
        let filter = filter.filter(|f| !f.is_empty());
        let kpi = kpi.filter(|k| !k.is_empty());

        match (filter, kpi) {
            (Some(filter), Some(kpi)) => SearchFilter::KpiAndFilePath { kpi, filter },
            (Some(filter), None) => SearchFilter::FilePath(filter),
            (None, Some(kpi)) => SearchFilter::Kpi(kpi),
            (None, None) => SearchFilter::All,
        }
    }
}

/// Contents of an indexed file, ready to send as an attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDownload {
    /// Raw file contents
    pub bytes: Vec<u8>,
    /// Suggested filename (last segment of the indexed path)
    pub filename: String,
}

impl FileDownload {
    /// Content type reported for every download
    pub const CONTENT_TYPE: &'static str = "text/plain";

    /// Payload size in bytes
    pub fn content_length(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Files index service
///
/// Stateless apart from the injected store, so it is shared as
/// `Arc<FileIndexService>` across requests without locking.
pub struct FileIndexService {
    store: Arc<dyn FileIndexStore>,
}

impl FileIndexService {
    /// Create a service on top of a store
    pub fn new(store: Arc<dyn FileIndexStore>) -> Self {
        Self { store }
    }

    /// List or search records, one page at a time
    ///
    /// # Arguments
    /// * `filter` - Optional path substring
    /// * `kpi` - Optional exact KPI key
    /// * `page` - Validated page request
    ///
    /// # Returns
    /// * `Ok(PageResult)` - The requested page with store totals
    /// * `Err(AppError)` - If the store query failed
    pub async fn list(
        &self,
        filter: Option<&str>,
        kpi: Option<&str>,
        page: PageRequest,
    ) -> Result<PageResult<FileIndexRecord>, AppError> {
        let search = SearchFilter::resolve(filter, kpi);
        debug!(?search, page = page.page(), size = page.size(), "Listing files index");

        let result = match search {
            SearchFilter::KpiAndFilePath { kpi, filter } => {
                self.store
                    .find_by_kpi_and_file_path(kpi, filter, &page)
                    .await?
            }
            SearchFilter::FilePath(filter) => self.store.find_by_file_path(filter, &page).await?,
            SearchFilter::Kpi(kpi) => self.store.find_by_kpi(kpi, &page).await?,
            SearchFilter::All => self.store.find_all(&page).await?,
        };

        Ok(PageResult::from(result))
    }

    /// Every record, unpaginated
    pub async fn list_all(&self) -> Result<Vec<FileIndexRecord>, AppError> {
        Ok(self.store.list_all().await?)
    }

    /// Every record for a KPI key, unpaginated
    pub async fn list_by_kpi(&self, kpi: &str) -> Result<Vec<FileIndexRecord>, AppError> {
        Ok(self.store.list_by_kpi(kpi).await?)
    }

    /// Read the file behind an index record
    ///
    /// # Returns
    /// * `Ok(FileDownload)` - Whole file contents and suggested filename
    /// * `Err(AppError::NotFound)` - No record with this id
    /// * `Err(AppError::IoFailure)` - The indexed file cannot be read
    pub async fn download(&self, id: FileIndexId) -> Result<FileDownload, AppError> {
        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no file index with id {}", id)))?;

        let bytes = fs::read(&record.file_path).await.map_err(|e| {
            warn!(id, path = %record.file_path, error = %e, "Indexed file is unreadable");
            AppError::IoFailure(format!("{} - {}", record.file_path, e))
        })?;

        debug!(id, path = %record.file_path, bytes = bytes.len(), "Read indexed file");
        Ok(FileDownload {
            bytes,
            filename: record.file_name().to_string(),
        })
    }

    /// Validate and persist a new record
    ///
    /// Upload metadata is stored exactly as submitted.
    pub async fn create(&self, record: NewFileIndexRecord) -> Result<FileIndexRecord, AppError> {
        record.validate()?;

        let saved = self.store.save(&record).await?;
        info!(id = saved.id, kpi = %saved.kpi, path = %saved.file_path, "Created file index");
        Ok(saved)
    }

    /// Remove an index record; the file on disk is left alone
    pub async fn delete(&self, id: FileIndexId) -> Result<(), AppError> {
        self.store.delete(id).await?;
        info!(id, "Deleted file index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryFileIndexStore;
    use tempfile::tempdir;

    fn create_test_service() -> FileIndexService {
        FileIndexService::new(Arc::new(InMemoryFileIndexStore::new()))
    }

    async fn seeded_service() -> FileIndexService {
        let service = create_test_service();
        for (kpi, path) in [
            ("sales", "/data/sales/jan.txt"),
            ("sales", "/data/sales/feb.txt"),
            ("churn", "/data/churn/jan.txt"),
            ("churn", "/data/churn/feb.txt"),
            ("churn", "/data/churn/mar.txt"),
        ] {
            service
                .create(NewFileIndexRecord::new(kpi, path))
                .await
                .expect("Failed to seed record");
        }
        service
    }

    #[test]
    fn test_resolve_dispatch_table() {
        assert_eq!(
            SearchFilter::resolve(Some("jan"), Some("sales")),
            SearchFilter::KpiAndFilePath {
                kpi: "sales",
                filter: "jan"
            }
        );
        assert_eq!(
            SearchFilter::resolve(Some("jan"), None),
            SearchFilter::FilePath("jan")
        );
        assert_eq!(
            SearchFilter::resolve(None, Some("sales")),
            SearchFilter::Kpi("sales")
        );
        assert_eq!(SearchFilter::resolve(None, None), SearchFilter::All);
    }

    #[test]
    fn test_resolve_empty_is_absent() {
        assert_eq!(SearchFilter::resolve(Some(""), Some("")), SearchFilter::All);
        assert_eq!(
            SearchFilter::resolve(Some(""), Some("sales")),
            SearchFilter::Kpi("sales")
        );
        assert_eq!(
            SearchFilter::resolve(Some("jan"), Some("")),
            SearchFilter::FilePath("jan")
        );
    }

    #[tokio::test]
    async fn test_list_joint_query_differs_from_single_filters() {
        let service = seeded_service().await;
        let page = PageRequest::default();

        let joint = service.list(Some("jan"), Some("sales"), page).await.unwrap();
        let by_path = service.list(Some("jan"), None, page).await.unwrap();
        let by_kpi = service.list(None, Some("sales"), page).await.unwrap();

        assert_eq!(joint.total_elements, 1);
        assert_eq!(joint.content[0].file_path, "/data/sales/jan.txt");
        assert_eq!(by_path.total_elements, 2);
        assert_eq!(by_kpi.total_elements, 2);
    }

    #[tokio::test]
    async fn test_list_blank_params_match_absent() {
        let service = seeded_service().await;
        let page = PageRequest::default();

        let blank = service.list(Some(""), Some(""), page).await.unwrap();
        let absent = service.list(None, None, page).await.unwrap();
        assert_eq!(blank, absent);
        assert_eq!(absent.total_elements, 5);
    }

    #[tokio::test]
    async fn test_list_page_bounds() {
        let service = seeded_service().await;

        for size in 1..=6 {
            let page = PageRequest::new(0, size).unwrap();
            let result = service.list(None, None, page).await.unwrap();
            assert!(result.content.len() as i64 <= size);
            assert_eq!(result.total_pages, (5 + size - 1) / size);
        }

        let last = service
            .list(None, Some("churn"), PageRequest::new(1, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(last.page_number, 1);
        assert_eq!(last.page_size, 2);
        assert_eq!(last.content.len(), 1);
        assert_eq!(last.total_pages, 2);
    }

    #[tokio::test]
    async fn test_list_all_and_by_kpi() {
        let service = seeded_service().await;
        assert_eq!(service.list_all().await.unwrap().len(), 5);
        assert_eq!(service.list_by_kpi("churn").await.unwrap().len(), 3);
        assert!(service.list_by_kpi("unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_validates() {
        let service = create_test_service();
        let result = service
            .create(NewFileIndexRecord {
                kpi: Some("sales".to_string()),
                ..Default::default()
            })
            .await;
        match result {
            Err(AppError::Validation(msg)) => assert!(msg.contains("filePath")),
            other => panic!("Expected Validation error, got: {:?}", other),
        }
        assert!(service.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_keeps_submitted_fields() {
        let service = create_test_service();
        let payload = NewFileIndexRecord {
            uploaded_by: Some("analyst".to_string()),
            uploaded_at: Some(1_700_000_000),
            ..NewFileIndexRecord::new("sales", "/data/sales/q1.txt")
        };

        let saved = service.create(payload).await.unwrap();
        assert!(saved.id > 0);
        assert_eq!(saved.kpi, "sales");
        assert_eq!(saved.file_path, "/data/sales/q1.txt");
        assert_eq!(saved.uploaded_by.as_deref(), Some("analyst"));
        assert_eq!(saved.uploaded_at, Some(1_700_000_000));

        let all = service.list_all().await.unwrap();
        assert_eq!(all, vec![saved]);
    }

    #[tokio::test]
    async fn test_create_leaves_omitted_metadata_empty() {
        let service = create_test_service();
        let saved = service
            .create(NewFileIndexRecord::new("k", "/f.txt"))
            .await
            .unwrap();
        assert_eq!(saved.uploaded_by, None);
        assert_eq!(saved.uploaded_at, None);

        let all = service.list_all().await.unwrap();
        assert_eq!(all, vec![saved]);
    }

    #[tokio::test]
    async fn test_create_allows_duplicate_paths() {
        let service = create_test_service();
        let a = service
            .create(NewFileIndexRecord::new("k", "/same.txt"))
            .await
            .unwrap();
        let b = service
            .create(NewFileIndexRecord::new("k", "/same.txt"))
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_download_reads_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("report.csv");
        std::fs::write(&file_path, "a,b\n1,2\n").expect("Failed to create file");

        let service = create_test_service();
        let saved = service
            .create(NewFileIndexRecord::new("sales", file_path.to_str().unwrap()))
            .await
            .unwrap();

        let download = service.download(saved.id).await.unwrap();
        assert_eq!(download.bytes, b"a,b\n1,2\n");
        assert_eq!(download.filename, "report.csv");
        assert_eq!(download.content_length(), 8);
    }

    #[tokio::test]
    async fn test_download_missing_record() {
        let service = create_test_service();
        match service.download(7).await {
            Err(AppError::NotFound(_)) => {}
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_missing_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("gone.txt");
        std::fs::write(&file_path, "x").expect("Failed to create file");

        let service = create_test_service();
        let saved = service
            .create(NewFileIndexRecord::new("k", file_path.to_str().unwrap()))
            .await
            .unwrap();
        std::fs::remove_file(&file_path).expect("Failed to remove file");

        match service.download(saved.id).await {
            Err(AppError::IoFailure(msg)) => assert!(msg.contains("gone.txt")),
            other => panic!("Expected IoFailure error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_keeps_file_on_disk() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("keep.txt");
        std::fs::write(&file_path, "keep").expect("Failed to create file");

        let service = create_test_service();
        let saved = service
            .create(NewFileIndexRecord::new("k", file_path.to_str().unwrap()))
            .await
            .unwrap();

        service.delete(saved.id).await.unwrap();
        assert!(matches!(
            service.download(saved.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(file_path.exists());
    }

    #[tokio::test]
    async fn test_delete_missing_id_succeeds() {
        let service = create_test_service();
        assert!(service.delete(12345).await.is_ok());
    }
}
