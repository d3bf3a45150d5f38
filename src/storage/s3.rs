//! S3-compatible blob store.
//!
//! Works against AWS S3 and DigitalOcean Spaces. Spaces credentials are read
//! from `DO_SPACES_*`; without them the standard AWS credential chain is used.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::storage::BlobStore;

const DEFAULT_SPACES_REGION: &str = "nyc3";
const DEFAULT_SPACES_ENDPOINT: &str = "https://nyc3.digitaloceanspaces.com";
const DEFAULT_BUCKET: &str = "course-catalog";

/// S3-based blob storage.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a new S3 storage instance.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Create S3 storage from environment configuration.
    ///
    /// - `DO_SPACES_KEY` / `DO_SPACES_SECRET`: static Spaces credentials
    /// - `DO_SPACES_REGION` (default `nyc3`), `DO_SPACES_ENDPOINT`
    /// - `DO_SPACES_BUCKET`, falling back to `S3_BUCKET`
    pub async fn from_env() -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let (Ok(key), Ok(secret)) = (
            std::env::var("DO_SPACES_KEY"),
            std::env::var("DO_SPACES_SECRET"),
        ) {
            let region = std::env::var("DO_SPACES_REGION")
                .unwrap_or_else(|_| DEFAULT_SPACES_REGION.to_string());
            let endpoint = std::env::var("DO_SPACES_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_SPACES_ENDPOINT.to_string());

            log::info!("Using Spaces endpoint {} ({})", endpoint, region);
            loader = loader
                .region(aws_config::Region::new(region))
                .endpoint_url(endpoint)
                .credentials_provider(Credentials::new(key, secret, None, None, "do-spaces"));
        }

        let config = loader.load().await;
        let client = Client::new(&config);

        let bucket = std::env::var("DO_SPACES_BUCKET")
            .or_else(|_| std::env::var("S3_BUCKET"))
            .unwrap_or_else(|_| DEFAULT_BUCKET.to_string());
        if bucket.trim().is_empty() {
            return Err(AppError::config("bucket name is empty"));
        }

        Ok(Self::new(client, bucket))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let len = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::S3(format!("put {}: {}", key, e.into_service_error())))?;

        log::debug!("Wrote {} bytes to {}", len, self.location(key));
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}
