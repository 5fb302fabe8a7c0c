//! S3 client implementation.

use std::path::Path;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use fleetq_models::ObjectUrl;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Object store used to publish artifacts.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file to `object`.
    async fn upload_file(&self, path: &Path, object: &ObjectUrl, content_type: &str) -> StorageResult<()>;
}

/// Configuration for the S3 client.
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    /// Endpoint override (local emulators)
    pub endpoint_url: Option<String>,
    /// Address buckets by path instead of virtual host
    pub force_path_style: bool,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            endpoint_url: std::env::var("AWS_ENDPOINT_URL").ok().filter(|s| !s.is_empty()),
            force_path_style: std::env::var("S3_FORCE_PATH_STYLE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// S3 storage client. The bucket comes from each object URL.
#[derive(Clone, Debug)]
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Create a new S3 client from a loaded AWS configuration.
    pub fn new(aws_config: &SdkConfig, config: &S3Config) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(aws_config)
            .force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn upload_file(&self, path: &Path, object: &ObjectUrl, content_type: &str) -> StorageResult<()> {
        debug!("Uploading {} to {}", path.display(), object);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(object.bucket())
            .key(object.key())
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(DisplayErrorContext(&e).to_string()))?;

        info!("Uploaded {} to {}", path.display(), object);
        Ok(())
    }
}

/// Content type for an object, from its extension.
pub fn content_type_for(object: &ObjectUrl) -> &'static str {
    match object.extension().to_ascii_lowercase().as_str() {
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "error" | "txt" | "log" => "text/plain",
        _ => "application/octet-stream",
    }
}
