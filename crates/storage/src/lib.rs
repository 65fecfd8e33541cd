//! Motionbooth Asset Gateway
//!
//! Uploads submission photos to object storage and issues time-limited
//! signed URLs for photos and generated videos:
//! - S3 (or any S3-compatible endpoint such as LocalStack) for production
//! - In-memory mock for testing and development

pub mod mock;
pub mod s3;

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage configuration error: {0}")]
    Configuration(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Presign failed: {0}")]
    PresignFailed(String),

    #[error("Invalid asset reference: {0}")]
    InvalidReference(String),
}

/// Opaque reference to a stored object, e.g. `s3://bucket/pending_photos/abc.jpg`.
pub type AssetRef = String;

/// Split an `scheme://bucket/key` reference into its bucket and key.
pub fn parse_asset_ref(reference: &str) -> Option<(&str, &str, &str)> {
    let (scheme, rest) = reference.split_once("://")?;
    let (bucket, key) = rest.split_once('/')?;
    if scheme.is_empty() || bucket.is_empty() || key.is_empty() {
        return None;
    }
    Some((scheme, bucket, key))
}

/// Storage service configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider (s3, mock)
    pub provider: String,
    /// Bucket receiving uploaded photos
    pub bucket: String,
    /// AWS region
    pub aws_region: Option<String>,
    /// AWS endpoint URL (for LocalStack or other S3-compatible stores)
    pub aws_endpoint_url: Option<String>,
}

impl StorageConfig {
    /// Create storage config from environment variables
    pub fn from_env() -> Result<Self, StorageError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let bucket = std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| {
            if provider == "mock" {
                "motionbooth-mock".to_string()
            } else {
                String::new()
            }
        });

        if bucket.is_empty() {
            return Err(StorageError::Configuration(
                "STORAGE_BUCKET is required for the s3 provider".to_string(),
            ));
        }

        Ok(Self {
            provider,
            bucket,
            aws_region: std::env::var("AWS_REGION").ok(),
            aws_endpoint_url: std::env::var("AWS_ENDPOINT_URL").ok(),
        })
    }
}

/// Object storage operations consumed by the submission flow
#[async_trait::async_trait]
pub trait AssetGateway: Send + Sync {
    /// Store `bytes` at `path` and return a reference usable by other services.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        path: &str,
        content_type: &str,
    ) -> Result<AssetRef, StorageError>;

    /// Issue a time-limited GET URL for a reference.
    ///
    /// Returns `None` when the reference cannot be signed (foreign scheme,
    /// empty, or the signer failed); callers show "unavailable" rather than
    /// failing the request.
    async fn signed_url(&self, reference: &str, ttl: Duration) -> Option<String>;
}

/// Factory for creating AssetGateway implementations
pub struct AssetGatewayFactory;

impl AssetGatewayFactory {
    pub async fn create(config: StorageConfig) -> Result<Box<dyn AssetGateway>, StorageError> {
        match config.provider.as_str() {
            "s3" => {
                tracing::info!(bucket = %config.bucket, "Creating S3 asset gateway");
                Ok(Box::new(s3::S3AssetGateway::new(config).await))
            }
            "mock" => {
                tracing::info!("Creating mock asset gateway");
                Ok(Box::new(mock::MockAssetGateway::new(config.bucket)))
            }
            provider => Err(StorageError::Configuration(format!(
                "Unknown storage provider: {}. Supported providers: s3, mock",
                provider
            ))),
        }
    }
}
