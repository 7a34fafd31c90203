//! Defines routes for the file API.
//!
//! ## Structure
//! - `POST   /files`        — upload a file (multipart field `file`)
//! - `GET    /files`        — list every stored file
//! - `PATCH  /files/{*key}` — overwrite an existing file, invalidating its CDN path
//! - `DELETE /files/{*key}` — delete a file
//! - `GET    /healthz`, `GET /readyz` — probes
//!
//! The wildcard `*key` allows nested keys like `photos/2025/img.jpg`.

use crate::{
    handlers::{
        file_handlers::{delete_file, list_files, update_file, upload_file},
        health_handlers::{healthz, readyz},
    },
    services::file_service::FileService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch},
};
use tower_http::trace::TraceLayer;

/// Build the router for all file routes.
///
/// The router carries shared state (`FileService`) to all handlers; callers
/// attach it with `with_state`. `max_upload_bytes` caps request bodies.
pub fn routes(max_upload_bytes: usize) -> Router<FileService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/files", get(list_files).post(upload_file))
        .route("/files/{*key}", patch(update_file).delete(delete_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}
