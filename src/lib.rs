//! File upload API backed by an S3 bucket, with public links served through a
//! CloudFront distribution.
//!
//! Uploads are stored under content-addressed (or random) keys, listings page
//! through the whole bucket, and updates of existing files invalidate the
//! file's path at the CDN.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

use axum::Router;
use services::file_service::FileService;

/// Router with every route mounted and `service` attached as state.
pub fn app(service: FileService, max_upload_bytes: usize) -> Router {
    routes::routes::routes(max_upload_bytes).with_state(service)
}
