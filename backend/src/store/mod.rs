//! Storage abstraction for the files index
//!
//! The [`FileIndexStore`] trait is the persistence collaborator behind
//! [`FileIndexService`](crate::services::files_index::FileIndexService).
//! It is injected as `Arc<dyn FileIndexStore>`, so the SQLite store used in
//! production and the in-memory store used by tests are interchangeable.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`find_all`](FileIndexStore::find_all) | All records, paginated |
//! | [`find_by_file_path`](FileIndexStore::find_by_file_path) | Path substring match, paginated |
//! | [`find_by_kpi`](FileIndexStore::find_by_kpi) | Exact KPI match, paginated |
//! | [`find_by_kpi_and_file_path`](FileIndexStore::find_by_kpi_and_file_path) | Both, paginated |
//! | [`list_all`](FileIndexStore::list_all) | All records |
//! | [`list_by_kpi`](FileIndexStore::list_by_kpi) | Exact KPI match |
//! | [`find_by_id`](FileIndexStore::find_by_id) | Single record |
//! | [`save`](FileIndexStore::save) | Insert, assigning an id |
//! | [`delete`](FileIndexStore::delete) | Remove by id |
//!
//! All listings are ordered by ascending id.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::config::{PersistenceConfig, StoreBackend};
use crate::error::AppError;
use crate::models::{FileIndexId, FileIndexRecord, NewFileIndexRecord, Page, PageRequest};

pub use memory::InMemoryFileIndexStore;
pub use sqlite::SqliteFileIndexStore;

/// Persistence backend for files index records
#[async_trait]
pub trait FileIndexStore: Send + Sync {
    /// All records, paginated
    async fn find_all(&self, page: &PageRequest) -> Result<Page<FileIndexRecord>>;

    /// Records whose `file_path` contains `path_fragment` (case-sensitive)
    async fn find_by_file_path(
        &self,
        path_fragment: &str,
        page: &PageRequest,
    ) -> Result<Page<FileIndexRecord>>;

    /// Records whose `kpi` equals `kpi`
    async fn find_by_kpi(&self, kpi: &str, page: &PageRequest) -> Result<Page<FileIndexRecord>>;

    /// Records matching both the KPI and the path fragment
    async fn find_by_kpi_and_file_path(
        &self,
        kpi: &str,
        path_fragment: &str,
        page: &PageRequest,
    ) -> Result<Page<FileIndexRecord>>;

    /// Every record, unpaginated
    async fn list_all(&self) -> Result<Vec<FileIndexRecord>>;

    /// Every record for a KPI, unpaginated
    async fn list_by_kpi(&self, kpi: &str) -> Result<Vec<FileIndexRecord>>;

    /// Look up a single record
    async fn find_by_id(&self, id: FileIndexId) -> Result<Option<FileIndexRecord>>;

    /// Insert a record; the store assigns its id
    async fn save(&self, record: &NewFileIndexRecord) -> Result<FileIndexRecord>;

    /// Remove a record. Removing a missing id is not an error.
    async fn delete(&self, id: FileIndexId) -> Result<()>;
}

/// Open the store selected by configuration
pub async fn open_store(config: &PersistenceConfig) -> Result<Arc<dyn FileIndexStore>, AppError> {
    match config.backend {
        StoreBackend::Sqlite => {
            let store = SqliteFileIndexStore::new(&config.database_path).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("Using in-memory files index store; records are lost on exit");
            Ok(Arc::new(InMemoryFileIndexStore::new()))
        }
    }
}
