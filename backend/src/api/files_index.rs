//! Files index API handlers
//!
//! Contains HTTP request handlers for listing, searching, downloading,
//! creating and deleting files index records.

use crate::api::extract::{AppJson, AppPath, AppQuery};
use crate::api::RouterState;
use crate::error::AppError;
use crate::models::page::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::models::{FileIndexId, FileIndexRecord, NewFileIndexRecord, PageRequest, PageResult};
use crate::services::FileDownload;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Deserializer};

/// Query parameters for the list/search endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListFilesIndexQuery {
    /// Substring to look for in file paths
    pub filter: Option<String>,
    /// Exact KPI key
    pub kpi: Option<String>,
    /// Zero-indexed page number (default 0)
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<i64>,
    /// Page size (default 10)
    #[serde(default, deserialize_with = "empty_as_none")]
    pub size: Option<i64>,
}

/// `?page=` with no value falls back to the default like an absent parameter
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Query parameters for the download endpoint
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Id of the index record whose file is wanted
    pub id: FileIndexId,
}

/// GET /v1/filesindex - Paginated list, optionally filtered by path and/or KPI
pub async fn list_files_index(
    State(service): State<RouterState>,
    AppQuery(params): AppQuery<ListFilesIndexQuery>,
) -> Result<Json<PageResult<FileIndexRecord>>, AppError> {
    let page = PageRequest::new(
        params.page.unwrap_or(DEFAULT_PAGE),
        params.size.unwrap_or(DEFAULT_PAGE_SIZE),
    )?;

    let result = service
        .list(params.filter.as_deref(), params.kpi.as_deref(), page)
        .await?;

    Ok(Json(result))
}

/// GET /v1/filesindex/all - Every record, unpaginated
pub async fn list_all_files_index(
    State(service): State<RouterState>,
) -> Result<Json<Vec<FileIndexRecord>>, AppError> {
    Ok(Json(service.list_all().await?))
}

/// GET /v1/filesindex/download?id= - Download the file behind a record
pub async fn download_file(
    State(service): State<RouterState>,
    AppQuery(params): AppQuery<DownloadQuery>,
) -> Result<Response, AppError> {
    let download = service.download(params.id).await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename={}",
        download.filename
    ))
    .map_err(|e| {
        AppError::Internal(anyhow::anyhow!(
            "Invalid filename for download: {} - {}",
            download.filename,
            e
        ))
    })?;

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static(FileDownload::CONTENT_TYPE),
        ),
        (header::CONTENT_DISPOSITION, disposition),
        (
            header::CONTENT_LENGTH,
            HeaderValue::from(download.content_length()),
        ),
    ];

    Ok((headers, download.bytes).into_response())
}

/// GET /v1/filesindex/:kpi - Every record for a KPI, unpaginated
pub async fn get_by_kpi(
    State(service): State<RouterState>,
    AppPath(kpi): AppPath<String>,
) -> Result<Json<Vec<FileIndexRecord>>, AppError> {
    Ok(Json(service.list_by_kpi(&kpi).await?))
}

/// POST /v1/filesindex - Create a record
pub async fn create_file_index(
    State(service): State<RouterState>,
    AppJson(request): AppJson<NewFileIndexRecord>,
) -> Result<(StatusCode, Json<FileIndexRecord>), AppError> {
    let saved = service.create(request).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// DELETE /v1/filesindex/:id - Delete a record (the file on disk is kept)
pub async fn delete_file_index(
    State(service): State<RouterState>,
    AppPath(id): AppPath<FileIndexId>,
) -> Result<StatusCode, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::OK)
}
