use crate::services::file_service::FileServiceError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Error returned by every handler.
///
/// `kind` names the failing layer (`StorageError`, `CdnError`, ...) so clients
/// can tell a storage failure from a cache invalidation failure.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status, kind and message.
    pub fn new(status: StatusCode, kind: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: msg.into(),
        }
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BadRequest", msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.kind,
            "message": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<FileServiceError> for AppError {
    fn from(err: FileServiceError) -> Self {
        tracing::error!(error = %err, "file operation failed");
        match err {
            // An update target that does not exist is the client's mistake.
            FileServiceError::NotFound(_) => {
                AppError::new(StatusCode::BAD_REQUEST, "NotFoundError", err.to_string())
            }
            FileServiceError::InvalidKey => AppError::bad_request(err.to_string()),
            FileServiceError::Storage(_) => {
                AppError::new(StatusCode::BAD_GATEWAY, "StorageError", err.to_string())
            }
            FileServiceError::Cdn(_) => {
                AppError::new(StatusCode::BAD_GATEWAY, "CdnError", err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cdn::CdnError;
    use crate::services::object_store::StorageError;

    #[test]
    fn maps_service_errors_to_status_and_kind() {
        let not_found = AppError::from(FileServiceError::NotFound("k".into()));
        assert_eq!(not_found.status, StatusCode::BAD_REQUEST);
        assert_eq!(not_found.kind, "NotFoundError");

        let storage = AppError::from(FileServiceError::Storage(StorageError::List("boom".into())));
        assert_eq!(storage.status, StatusCode::BAD_GATEWAY);
        assert_eq!(storage.kind, "StorageError");
        assert!(storage.message.contains("boom"));

        let cdn = AppError::from(FileServiceError::Cdn(CdnError::InvalidBaseUrl("x".into())));
        assert_eq!(cdn.kind, "CdnError");
    }
}
