use anyhow::Result;
use cdn_file_store::{
    config::{AppConfig, StorageBackend},
    services::{
        cdn::{CdnBinding, CloudFrontProvider},
        file_service::FileService,
        object_store::{MemoryObjectStore, ObjectStore, S3ObjectStore},
    },
};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cdn_file_store=info,tower_http=info")),
        )
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting cdn-file-store with config: {:?}", cfg);

    // --- Object store ---
    let store: Arc<dyn ObjectStore> = match cfg.storage_backend {
        StorageBackend::S3 => Arc::new(
            S3ObjectStore::new(
                cfg.bucket_name.clone(),
                cfg.region.clone(),
                cfg.s3_endpoint_url.clone(),
            )
            .await,
        ),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; objects are lost on exit");
            Arc::new(MemoryObjectStore::new())
        }
    };

    // --- CDN binding, resolved once before serving ---
    let cdn = match &cfg.cf_dist_id {
        Some(dist_id) => {
            let provider = Arc::new(CloudFrontProvider::new(cfg.region.clone()).await);
            CdnBinding::resolve(provider, dist_id.clone()).await?
        }
        None => {
            let base_url = cfg.fallback_base_url();
            tracing::info!(
                "CF_DIST_ID not set; CDN invalidation disabled, public URLs under {}",
                base_url
            );
            CdnBinding::disabled(&base_url)?
        }
    };

    // --- Initialize core service ---
    let service = FileService::new(store, Arc::new(cdn), cfg.key_strategy, cfg.delete_policy);

    // --- Build router ---
    let app = cdn_file_store::app(service, cfg.max_upload_bytes);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
