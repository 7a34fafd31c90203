use crate::services::{file_service::DeletePolicy, naming::KeyStrategy};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, fmt, str::FromStr};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Where object payloads go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StorageBackend {
    #[default]
    S3,
    /// Process-local bucket, lost on exit.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "unknown storage backend `{}` (expected `s3` or `memory`)",
                other
            )),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S3 => f.write_str("s3"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub region: String,
    pub bucket_name: String,
    pub cf_dist_id: Option<String>,
    pub s3_endpoint_url: Option<String>,
    pub public_base_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub key_strategy: KeyStrategy,
    pub delete_policy: DeletePolicy,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "File upload API backed by S3 and CloudFront")]
pub struct Args {
    /// Host to bind to (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Storage and CDN region (overrides REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Target bucket (overrides BUCKET_NAME)
    #[arg(long)]
    pub bucket_name: Option<String>,

    /// CloudFront distribution id (overrides CF_DIST_ID)
    #[arg(long)]
    pub cf_dist_id: Option<String>,

    /// Endpoint of an S3-compatible provider (overrides S3_ENDPOINT_URL)
    #[arg(long)]
    pub s3_endpoint_url: Option<String>,

    /// Base URL for public links when no distribution is set (overrides PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// `s3` or `memory` (overrides STORAGE_BACKEND)
    #[arg(long)]
    pub storage_backend: Option<StorageBackend>,

    /// `content-hash` or `uuid` (overrides KEY_STRATEGY)
    #[arg(long)]
    pub key_strategy: Option<KeyStrategy>,

    /// `await` or `detach` (overrides DELETE_POLICY)
    #[arg(long)]
    pub delete_policy: Option<DeletePolicy>,

    /// Request body limit in bytes (overrides MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::merge(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge CLI args over values read through `lookup`.
    pub fn merge(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let storage_backend = match args.storage_backend {
            Some(backend) => backend,
            None => parse_var(&var, "STORAGE_BACKEND")?.unwrap_or_default(),
        };

        let bucket_name = match args.bucket_name.or_else(|| var("BUCKET_NAME")) {
            Some(bucket) => bucket,
            None if storage_backend == StorageBackend::Memory => "local".into(),
            None => bail!("BUCKET_NAME must be set for the s3 storage backend"),
        };

        let cfg = Self {
            host: args
                .host
                .or_else(|| var("HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: match args.port {
                Some(port) => port,
                None => parse_var(&var, "PORT")?.unwrap_or(3000),
            },
            region: args
                .region
                .or_else(|| var("REGION"))
                .unwrap_or_else(|| "us-east-1".into()),
            bucket_name,
            cf_dist_id: args.cf_dist_id.or_else(|| var("CF_DIST_ID")),
            s3_endpoint_url: args.s3_endpoint_url.or_else(|| var("S3_ENDPOINT_URL")),
            public_base_url: args.public_base_url.or_else(|| var("PUBLIC_BASE_URL")),
            storage_backend,
            key_strategy: match args.key_strategy {
                Some(strategy) => strategy,
                None => parse_var(&var, "KEY_STRATEGY")?.unwrap_or_default(),
            },
            delete_policy: match args.delete_policy {
                Some(policy) => policy,
                None => parse_var(&var, "DELETE_POLICY")?.unwrap_or_default(),
            },
            max_upload_bytes: match args.max_upload_bytes {
                Some(limit) => limit,
                None => parse_var(&var, "MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
        };

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL for public links when no CloudFront distribution is bound.
    ///
    /// `PUBLIC_BASE_URL` wins; otherwise the bucket's own URL.
    pub fn fallback_base_url(&self) -> String {
        if let Some(base) = &self.public_base_url {
            return base.clone();
        }
        match &self.s3_endpoint_url {
            Some(endpoint) => format!("{}/{}/", endpoint.trim_end_matches('/'), self.bucket_name),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/",
                self.bucket_name, self.region
            ),
        }
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    var(name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|err| anyhow::anyhow!("{}", err))
                .with_context(|| format!("parsing {} value `{}`", name, value))
        })
        .transpose()
}
