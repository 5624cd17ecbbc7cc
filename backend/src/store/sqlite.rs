//! SQLite-backed [`FileIndexStore`]
//!
//! Handles all database interactions for files index records.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::{FileIndexId, FileIndexRecord, NewFileIndexRecord, Page, PageRequest};

use super::FileIndexStore;

const COLUMNS: &str = "id, kpi, file_path, uploaded_by, uploaded_at";

/// Filter applied to a files index query
#[derive(Debug, Clone, Copy)]
enum Filter<'a> {
    All,
    FilePath(&'a str),
    Kpi(&'a str),
    KpiAndFilePath(&'a str, &'a str),
}

impl<'a> Filter<'a> {
    fn where_clause(&self) -> &'static str {
        match self {
            Filter::All => "",
            Filter::FilePath(_) => " WHERE instr(file_path, ?) > 0",
            Filter::Kpi(_) => " WHERE kpi = ?",
            Filter::KpiAndFilePath(_, _) => " WHERE kpi = ? AND instr(file_path, ?) > 0",
        }
    }

    fn args(&self) -> Vec<&'a str> {
        match *self {
            Filter::All => vec![],
            Filter::FilePath(fragment) => vec![fragment],
            Filter::Kpi(kpi) => vec![kpi],
            Filter::KpiAndFilePath(kpi, fragment) => vec![kpi, fragment],
        }
    }
}

/// Database connection pool for files index operations
pub struct SqliteFileIndexStore {
    pool: SqlitePool,
}

impl SqliteFileIndexStore {
    /// Initialize database connection pool and apply migrations
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file, or `:memory:`
    ///
    /// # Returns
    /// * `Ok(SqliteFileIndexStore)` if successful
    /// * `Err(AppError)` if connection or migration failed
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let in_memory = db_path.contains(":memory:");

        // Ensure parent directory exists
        if !in_memory {
            if let Some(parent) = PathBuf::from(db_path.trim_start_matches("sqlite:")).parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Failed to create db directory: {}", e))
                })?;
            }
        }

        // SQLite connection string format: sqlite:path/to/db.db
        let connection_string = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            format!("sqlite:{}", db_path)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid database path: {}", e)))?
            .create_if_missing(true);

        // Every in-memory connection is its own database; keep exactly one
        let max_connections = if in_memory { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to connect to database: {}", e))
            })?;

        info!("Connected to SQLite database at: {}", db_path);

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_create_files_index.sql");

        for statement in migration_statements(migration_sql) {
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!(
                        "Migration failed: {} - Statement: {}",
                        e,
                        statement.chars().take(100).collect::<String>()
                    ))
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    async fn fetch_page(
        &self,
        filter: Filter<'_>,
        page: &PageRequest,
    ) -> Result<Page<FileIndexRecord>> {
        let args = filter.args();

        let count_sql = format!("SELECT COUNT(*) FROM files_index{}", filter.where_clause());
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_query = count_query.bind(*arg);
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .context("Failed to count files index records")?;

        let select_sql = format!(
            "SELECT {} FROM files_index{} ORDER BY id ASC LIMIT ? OFFSET ?",
            COLUMNS,
            filter.where_clause()
        );
        let mut select_query = sqlx::query_as::<_, FileIndexRecord>(&select_sql);
        for arg in &args {
            select_query = select_query.bind(*arg);
        }
        let content = select_query
            .bind(page.size())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch files index page")?;

        debug!(
            ?filter,
            page = page.page(),
            size = page.size(),
            total,
            "Fetched files index page"
        );
        Ok(Page::new(content, total, *page))
    }

    async fn fetch_list(&self, filter: Filter<'_>) -> Result<Vec<FileIndexRecord>> {
        let sql = format!(
            "SELECT {} FROM files_index{} ORDER BY id ASC",
            COLUMNS,
            filter.where_clause()
        );
        let mut query = sqlx::query_as::<_, FileIndexRecord>(&sql);
        for arg in filter.args() {
            query = query.bind(arg);
        }
        query
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch files index records")
    }
}

/// Split a migration script into executable statements, dropping `--` comments
fn migration_statements(sql: &str) -> Vec<String> {
    let mut cleaned_sql = String::new();
    for line in sql.lines() {
        let without_comment = match line.find("--") {
            Some(pos) => &line[..pos],
            None => line,
        };
        let trimmed = without_comment.trim();
        if trimmed.is_empty() {
            continue;
        }
        cleaned_sql.push_str(trimmed);
        cleaned_sql.push(' ');
    }

    cleaned_sql
        .split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl FileIndexStore for SqliteFileIndexStore {
    async fn find_all(&self, page: &PageRequest) -> Result<Page<FileIndexRecord>> {
        self.fetch_page(Filter::All, page).await
    }

    async fn find_by_file_path(
        &self,
        path_fragment: &str,
        page: &PageRequest,
    ) -> Result<Page<FileIndexRecord>> {
        self.fetch_page(Filter::FilePath(path_fragment), page).await
    }

    async fn find_by_kpi(&self, kpi: &str, page: &PageRequest) -> Result<Page<FileIndexRecord>> {
        self.fetch_page(Filter::Kpi(kpi), page).await
    }

    async fn find_by_kpi_and_file_path(
        &self,
        kpi: &str,
        path_fragment: &str,
        page: &PageRequest,
    ) -> Result<Page<FileIndexRecord>> {
        self.fetch_page(Filter::KpiAndFilePath(kpi, path_fragment), page)
            .await
    }

    async fn list_all(&self) -> Result<Vec<FileIndexRecord>> {
        self.fetch_list(Filter::All).await
    }

    async fn list_by_kpi(&self, kpi: &str) -> Result<Vec<FileIndexRecord>> {
        self.fetch_list(Filter::Kpi(kpi)).await
    }

    async fn find_by_id(&self, id: FileIndexId) -> Result<Option<FileIndexRecord>> {
        let sql = format!("SELECT {} FROM files_index WHERE id = ?", COLUMNS);
        sqlx::query_as::<_, FileIndexRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch files index record")
    }

    async fn save(&self, record: &NewFileIndexRecord) -> Result<FileIndexRecord> {
        record.validate()?;
        let (kpi, file_path) = record
            .required_fields()
            .context("validated record is missing kpi or filePath")?;

        let result = sqlx::query(
            "INSERT INTO files_index (kpi, file_path, uploaded_by, uploaded_at) VALUES (?, ?, ?, ?)",
        )
        .bind(kpi)
        .bind(file_path)
        .bind(&record.uploaded_by)
        .bind(record.uploaded_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert files index record")?;

        let saved = FileIndexRecord {
            id: result.last_insert_rowid(),
            kpi: kpi.to_string(),
            file_path: file_path.to_string(),
            uploaded_by: record.uploaded_by.clone(),
            uploaded_at: record.uploaded_at,
        };

        debug!(id = saved.id, kpi = %saved.kpi, "Inserted files index record");
        Ok(saved)
    }

    async fn delete(&self, id: FileIndexId) -> Result<()> {
        let result = sqlx::query("DELETE FROM files_index WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete files index record")?;

        debug!(
            id,
            rows_affected = result.rows_affected(),
            "Deleted files index record"
        );
        Ok(())
    }
}
