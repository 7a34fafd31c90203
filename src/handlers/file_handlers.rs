//! HTTP handlers for `/files`.
//! Buffers the multipart `file` field, delegates to `FileService`, and builds
//! public URLs from the CDN binding.

use crate::{
    errors::AppError,
    models::{file_data::FileData, multipart::UploadedFile},
    services::file_service::FileService,
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

/// Name of the multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// POST `/files` — upload a file under a generated key.
pub async fn upload_file(
    State(service): State<FileService>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let file = read_file_field(multipart).await?;
    let original_filename = file.original_filename.clone();
    let size = file.size();

    let object = service.upload(file).await?;
    let url = service.public_url(&object.key);
    info!(filename = %original_filename, size, url = %url, "file uploaded");

    Ok((StatusCode::CREATED, Json(FileData::written(object, url))))
}

/// GET `/files` — every object in the bucket.
pub async fn list_files(
    State(service): State<FileService>,
) -> Result<Json<Vec<FileData>>, AppError> {
    let objects = service.list().await?;
    let files = objects
        .into_iter()
        .map(|object| {
            let url = service.public_url(&object.key);
            FileData::listed(object, url)
        })
        .collect();

    Ok(Json(files))
}

/// PATCH `/files/{*key}` — overwrite an existing file and invalidate its CDN path.
pub async fn update_file(
    State(service): State<FileService>,
    Path(key): Path<String>,
    multipart: Multipart,
) -> Result<Json<FileData>, AppError> {
    let file = read_file_field(multipart).await?;

    let object = service.update(&key, file).await?;
    let url = service.public_url(&object.key);
    info!(key = %key, url = %url, "file updated");

    Ok(Json(FileData::written(object, url)))
}

/// DELETE `/files/{*key}`.
pub async fn delete_file(
    State(service): State<FileService>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    service.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pull the `file` field out of a multipart body; other fields are skipped.
async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(format!("Failed to read file data: {}", e)))?;

        return Ok(UploadedFile::new(bytes, filename, content_type));
    }

    Err(AppError::bad_request("missing multipart field `file`"))
}
