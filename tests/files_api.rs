use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use cdn_file_store::services::{
    cdn::{CdnBinding, MockCdnProvider},
    file_service::{DeletePolicy, FileService},
    naming::KeyStrategy,
    object_store::MemoryObjectStore,
};
use serde_json::Value;
use std::sync::Arc;

const CDN_DOMAIN: &str = "d1234.cloudfront.net";
const HELLO_KEY: &str = "qvTGHdzF6KLavt4PO0gs2a6pQ00.txt";

struct Harness {
    server: TestServer,
    store: MemoryObjectStore,
    cdn: MockCdnProvider,
}

async fn harness_with(store: MemoryObjectStore, key_strategy: KeyStrategy) -> Harness {
    harness_with_cdn(store, MockCdnProvider::new(CDN_DOMAIN), key_strategy).await
}

async fn harness_with_cdn(
    store: MemoryObjectStore,
    cdn: MockCdnProvider,
    key_strategy: KeyStrategy,
) -> Harness {
    let binding = CdnBinding::resolve(Arc::new(cdn.clone()), "EDIST").await.unwrap();
    let service = FileService::new(
        Arc::new(store.clone()),
        Arc::new(binding),
        key_strategy,
        DeletePolicy::Await,
    );
    let server = TestServer::new(cdn_file_store::app(service, 1024 * 1024)).unwrap();

    Harness { server, store, cdn }
}

async fn harness() -> Harness {
    harness_with(MemoryObjectStore::new(), KeyStrategy::ContentHash).await
}

fn file_form(body: &'static [u8], filename: &str, mime: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from_static(body))
        .file_name(filename)
        .mime_type(mime);
    MultipartForm::new().add_part("file", part)
}

#[tokio::test]
async fn upload_delete_then_list_is_empty() {
    let h = harness().await;

    let upload = h
        .server
        .post("/files")
        .multipart(file_form(b"hello", "a.txt", "text/plain"))
        .await;
    assert_eq!(upload.status_code(), StatusCode::CREATED);

    let body: Value = upload.json();
    assert_eq!(body["key"], HELLO_KEY);
    assert_eq!(body["url"], format!("https://{}/{}", CDN_DOMAIN, HELLO_KEY));
    assert_eq!(body["size"], 5);
    assert_eq!(body["type"], "text/plain");

    let delete = h.server.delete(&format!("/files/{}", HELLO_KEY)).await;
    assert_eq!(delete.status_code(), StatusCode::NO_CONTENT);

    let list = h.server.get("/files").await;
    assert_eq!(list.status_code(), StatusCode::OK);
    let files: Vec<Value> = list.json();
    assert!(files.is_empty());
}

#[tokio::test]
async fn list_spans_every_page_with_urls() {
    let store = MemoryObjectStore::new()
        .with_page_size(2)
        .with_object("a.txt", b"1", None)
        .with_object("b.txt", b"22", None)
        .with_object("c.txt", b"333", None)
        .with_object("d.txt", b"4444", None)
        .with_object("e.txt", b"55555", None);
    let h = harness_with(store, KeyStrategy::ContentHash).await;

    let files: Vec<Value> = h.server.get("/files").await.json();

    let keys: Vec<&str> = files.iter().map(|f| f["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"]);
    assert_eq!(files[2]["size"], 3);
    assert_eq!(files[2]["url"], format!("https://{}/c.txt", CDN_DOMAIN));
    assert!(files[0].get("lastModified").is_some());
    assert!(files[0].get("type").is_none());
    assert_eq!(h.store.list_page_count(), 3);
}

#[tokio::test]
async fn update_of_missing_file_is_a_client_error() {
    let h = harness().await;

    let response = h
        .server
        .patch("/files/missing.txt")
        .multipart(file_form(b"new", "x.txt", "text/plain"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "NotFoundError");
    assert_eq!(h.store.put_count(), 0);
    assert!(h.cdn.invalidations().is_empty());
}

#[tokio::test]
async fn update_overwrites_and_invalidates_path() {
    let store = MemoryObjectStore::new().with_object("logo.png", b"old", Some("image/png"));
    let h = harness_with(store, KeyStrategy::ContentHash).await;

    let response = h
        .server
        .patch("/files/logo.png")
        .multipart(file_form(b"new-logo", "logo-v2.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["key"], "logo.png");
    assert_eq!(body["size"], 8);
    assert_eq!(body["type"], "image/png");
    assert_eq!(h.store.bytes("logo.png").unwrap().as_ref(), b"new-logo");

    let calls = h.cdn.invalidations();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/logo.png");
}

#[tokio::test]
async fn nested_keys_route_through_wildcard() {
    let store = MemoryObjectStore::new().with_object("photos/2025/cat.jpg", b"meow", None);
    let h = harness_with(store, KeyStrategy::ContentHash).await;

    let response = h.server.delete("/files/photos/2025/cat.jpg").await;

    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn random_strategy_keeps_extension() {
    let h = harness_with(MemoryObjectStore::new(), KeyStrategy::Random).await;

    let body: Value = h
        .server
        .post("/files")
        .multipart(file_form(b"%PDF", "report.pdf", "application/pdf"))
        .await
        .json();

    let key = body["key"].as_str().unwrap();
    assert!(key.ends_with(".pdf"));
    assert_ne!(key, "report.pdf");
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let h = harness().await;
    let form = MultipartForm::new().add_text("note", "no file here");

    let response = h.server.post("/files").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "BadRequest");
    assert_eq!(h.store.put_count(), 0);
}

#[tokio::test]
async fn storage_failure_on_delete_is_reported() {
    let h = harness_with(
        MemoryObjectStore::new().with_failing_deletes(),
        KeyStrategy::ContentHash,
    )
    .await;

    let response = h.server.delete("/files/a.txt").await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"], "StorageError");
}

#[tokio::test]
async fn update_invalidates_the_percent_encoded_path() {
    let store = MemoryObjectStore::new().with_object("menus/café menu.png", b"old", None);
    let h = harness_with(store, KeyStrategy::ContentHash).await;

    let response = h
        .server
        .patch("/files/menus/caf%C3%A9%20menu.png")
        .multipart(file_form(b"new", "menu.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(
        body["url"],
        format!("https://{}/menus/caf%C3%A9%20menu.png", CDN_DOMAIN)
    );
    let calls = h.cdn.invalidations();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/menus/caf%C3%A9%20menu.png");
}

#[tokio::test]
async fn keys_with_inner_double_dots_can_be_updated_and_deleted() {
    let store = MemoryObjectStore::new().with_object("v1..2.txt", b"old", None);
    let h = harness_with(store, KeyStrategy::ContentHash).await;

    let update = h
        .server
        .patch("/files/v1..2.txt")
        .multipart(file_form(b"new", "v1..2.txt", "text/plain"))
        .await;
    assert_eq!(update.status_code(), StatusCode::OK);

    let delete = h.server.delete("/files/v1..2.txt").await;
    assert_eq!(delete.status_code(), StatusCode::NO_CONTENT);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn storage_failure_on_upload_is_reported() {
    let h = harness_with(
        MemoryObjectStore::new().with_failing_puts(),
        KeyStrategy::ContentHash,
    )
    .await;

    let response = h
        .server
        .post("/files")
        .multipart(file_form(b"hello", "a.txt", "text/plain"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"], "StorageError");
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn storage_failure_on_list_is_reported() {
    let store = MemoryObjectStore::new()
        .with_object("a.txt", b"1", None)
        .with_failing_lists();
    let h = harness_with(store, KeyStrategy::ContentHash).await;

    let response = h.server.get("/files").await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"], "StorageError");
}

#[tokio::test]
async fn failed_existence_check_is_reported_without_writing() {
    let store = MemoryObjectStore::new()
        .with_object("logo.png", b"old", None)
        .with_failing_heads();
    let h = harness_with(store, KeyStrategy::ContentHash).await;

    let response = h
        .server
        .patch("/files/logo.png")
        .multipart(file_form(b"new", "logo.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"], "StorageError");
    assert_eq!(h.store.put_count(), 0);
    assert_eq!(h.store.bytes("logo.png").unwrap().as_ref(), b"old");
    assert!(h.cdn.invalidations().is_empty());
}

#[tokio::test]
async fn invalidation_failure_is_reported_after_the_write() {
    let store = MemoryObjectStore::new().with_object("logo.png", b"old", None);
    let cdn = MockCdnProvider::new(CDN_DOMAIN).with_failing_invalidation();
    let h = harness_with_cdn(store, cdn, KeyStrategy::ContentHash).await;

    let response = h
        .server
        .patch("/files/logo.png")
        .multipart(file_form(b"new", "logo.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"], "CdnError");
    assert_eq!(h.store.bytes("logo.png").unwrap().as_ref(), b"new");
}

#[tokio::test]
async fn readiness_fails_when_the_store_errors() {
    let h = harness_with(
        MemoryObjectStore::new().with_failing_heads(),
        KeyStrategy::ContentHash,
    )
    .await;

    let ready = h.server.get("/readyz").await;

    assert_eq!(ready.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = ready.json();
    assert_eq!(body["checks"]["object_store"]["ok"], false);
}

#[tokio::test]
async fn health_endpoints_report_ok() {
    let h = harness().await;

    let health: Value = h.server.get("/healthz").await.json();
    assert_eq!(health["status"], "ok");

    let ready = h.server.get("/readyz").await;
    assert_eq!(ready.status_code(), StatusCode::OK);
    let body: Value = ready.json();
    assert_eq!(body["checks"]["object_store"]["ok"], true);
    assert_eq!(body["checks"]["cdn"]["ok"], true);
}
