//! API module
//!
//! Contains the HTTP router and request handlers for the files index endpoints

pub mod extract;
pub mod files_index;
pub mod middleware;

use crate::services::FileIndexService;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Base path of the files index API (version 1)
pub const FILES_INDEX_PATH: &str = "/v1/filesindex";

/// Shared state handed to every handler
pub type RouterState = Arc<FileIndexService>;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status ("healthy")
    pub status: String,
    /// Crate version
    pub version: String,
    /// Human-readable message
    pub message: String,
}

/// GET /api/health - Liveness check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "Files index service is healthy".to_string(),
    })
}

/// Build the application router with all routes and middleware
pub fn build_router(service: RouterState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route(
            FILES_INDEX_PATH,
            get(files_index::list_files_index).post(files_index::create_file_index),
        )
        .route(
            &format!("{}/all", FILES_INDEX_PATH),
            get(files_index::list_all_files_index),
        )
        .route(
            &format!("{}/download", FILES_INDEX_PATH),
            get(files_index::download_file),
        )
        // One capture serves both the KPI lookup (GET) and delete by id (DELETE)
        .route(
            &format!("{}/:key", FILES_INDEX_PATH),
            get(files_index::get_by_kpi).delete(files_index::delete_file_index),
        )
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(service)
}
