//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the object store and CDN binding

use crate::services::file_service::FileService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// Key probed by the readiness check; its absence is the expected answer.
const READYZ_PROBE_KEY: &str = ".readyz-probe";

/// `GET /healthz`
///
/// Very small liveness probe, always 200 OK. Performs no I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// 1. Issues a HEAD for a probe key against the object store; "not found"
///    counts as reachable.
/// 2. Reports the CDN base URL bound at startup.
///
/// HTTP 200 when all checks pass, 503 otherwise.
pub async fn readyz(State(service): State<FileService>) -> impl IntoResponse {
    let store_check = match service.store.head(READYZ_PROBE_KEY).await {
        Ok(_) => CheckStatus {
            ok: true,
            detail: None,
        },
        Err(e) => CheckStatus {
            ok: false,
            detail: Some(format!("error: {}", e)),
        },
    };

    let cdn_check = CheckStatus {
        ok: true,
        detail: Some(match service.cdn.distribution_id() {
            Some(id) => format!("distribution {} at {}", id, service.cdn.base_url()),
            None => format!("no distribution, serving from {}", service.cdn.base_url()),
        }),
    };

    let overall_ok = store_check.ok && cdn_check.ok;

    let mut checks = HashMap::new();
    checks.insert("object_store", store_check);
    checks.insert("cdn", cdn_check);

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    detail: Option<String>,
}
