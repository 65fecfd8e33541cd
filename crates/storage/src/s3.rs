//! S3 Asset Gateway Implementation
//!
//! Uploads with `PutObject` and signs `GetObject` requests with the SDK
//! presigner. Works against LocalStack when `AWS_ENDPOINT_URL` is set.

use std::time::Duration;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::SharedCredentialsProvider;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

use crate::{parse_asset_ref, AssetGateway, AssetRef, StorageConfig, StorageError};

/// S3-backed asset gateway
pub struct S3AssetGateway {
    client: S3Client,
    bucket: String,
}

impl S3AssetGateway {
    pub async fn new(config: StorageConfig) -> Self {
        let region = config
            .aws_region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let sdk_config = match config.aws_endpoint_url.as_ref() {
            Some(endpoint_url) => {
                tracing::info!("Using custom S3 endpoint: {}", endpoint_url);

                // LocalStack accepts any static credentials
                let credentials = Credentials::new(
                    "test-access-key",
                    "test-secret-key",
                    None,
                    None,
                    "localstack-storage-provider",
                );

                aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region))
                    .endpoint_url(endpoint_url)
                    .credentials_provider(SharedCredentialsProvider::new(credentials))
                    .load()
                    .await
            }
            None => {
                aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region))
                    .load()
                    .await
            }
        };

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.aws_endpoint_url.is_some())
            .build();

        Self {
            client: S3Client::from_conf(s3_config),
            bucket: config.bucket,
        }
    }

    /// Resolve a reference to (bucket, key); bare keys live in the configured bucket.
    fn locate<'a>(&'a self, reference: &'a str) -> Result<(&'a str, &'a str), StorageError> {
        match parse_asset_ref(reference) {
            Some(("s3", bucket, key)) => Ok((bucket, key)),
            Some((scheme, _, _)) => Err(StorageError::InvalidReference(format!(
                "cannot sign {scheme}:// references with the S3 gateway"
            ))),
            None if !reference.is_empty() && !reference.contains("://") => {
                Ok((self.bucket.as_str(), reference))
            }
            None => Err(StorageError::InvalidReference(reference.to_string())),
        }
    }

    async fn presign_get(
        &self,
        reference: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let (bucket, key) = self.locate(reference)?;

        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}

#[async_trait::async_trait]
impl AssetGateway for S3AssetGateway {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        path: &str,
        content_type: &str,
    ) -> Result<AssetRef, StorageError> {
        tracing::debug!(size = bytes.len(), path = %path, "Uploading object");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let reference = format!("s3://{}/{}", self.bucket, path);
        tracing::info!(reference = %reference, "Object uploaded");
        Ok(reference)
    }

    async fn signed_url(&self, reference: &str, ttl: Duration) -> Option<String> {
        match self.presign_get(reference, ttl).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, reference = %reference, "Could not sign asset URL");
                None
            }
        }
    }
}
