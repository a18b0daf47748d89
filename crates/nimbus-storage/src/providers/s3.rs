//! S3-compatible object store.
//!
//! All data-plane traffic is pre-signed: the server never proxies bytes.
//! Works against AWS S3 and path-style-compatible stores (MinIO) via the
//! `endpoint` setting.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use tracing::info;

use nimbus_core::config::storage::S3Config;
use nimbus_core::error::AppError;
use nimbus_core::result::AppResult;
use nimbus_core::traits::object_store::{ObjectDescriptor, ObjectStore, UploadPart};

/// S3-compatible object store provider.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    presign_expiry: Duration,
}

impl S3ObjectStore {
    /// Create a new S3 object store from configuration.
    ///
    /// Static credentials from the config take precedence; otherwise the
    /// ambient AWS credential chain (env, profile, instance role) is used.
    pub async fn new(config: &S3Config, presign_expiry_seconds: u64) -> AppResult<Self> {
        if config.bucket.is_empty() {
            return Err(AppError::configuration("S3 bucket is not configured"));
        }

        let base = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&base);
        if !config.endpoint.is_empty() {
            builder = builder
                .endpoint_url(config.endpoint.clone())
                .force_path_style(true);
        }
        if !config.access_key.is_empty() {
            let credentials = aws_sdk_s3::config::Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "nimbus-config",
            );
            builder = builder.credentials_provider(credentials);
        }

        info!(
            region = %config.region,
            bucket = %config.bucket,
            endpoint = %config.endpoint,
            "Initializing S3 object store"
        );

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            presign_expiry: Duration::from_secs(presign_expiry_seconds),
        })
    }

    fn presigning(&self) -> AppResult<PresigningConfig> {
        PresigningConfig::expires_in(self.presign_expiry)
            .map_err(|e| AppError::configuration(format!("Invalid presign expiry: {e}")))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map(|_| true)
            .map_err(|e| AppError::store_unavailable(format!("S3 bucket check failed: {e}")))
    }

    async fn presign_put(&self, key: &str, content_type: &str) -> AppResult<String> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(self.presigning()?)
            .await
            .map_err(|e| AppError::store_unavailable(format!("Failed to presign PUT: {e}")))?;

        Ok(presigned.uri().to_string())
    }

    async fn create_multipart(&self, key: &str, content_type: &str) -> AppResult<String> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                AppError::store_unavailable(format!("Failed to open multipart session: {e}"))
            })?;

        output
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| AppError::store_unavailable("Store returned no multipart session id"))
    }

    async fn presign_part(
        &self,
        key: &str,
        session_id: &str,
        part_number: i32,
    ) -> AppResult<String> {
        let presigned = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(session_id)
            .part_number(part_number)
            .presigned(self.presigning()?)
            .await
            .map_err(|e| AppError::store_unavailable(format!("Failed to presign part: {e}")))?;

        Ok(presigned.uri().to_string())
    }

    async fn complete_multipart(
        &self,
        key: &str,
        session_id: &str,
        parts: &[UploadPart],
    ) -> AppResult<ObjectDescriptor> {
        let completed: Vec<CompletedPart> = parts
            .iter()
            .map(|p| {
                CompletedPart::builder()
                    .part_number(p.part_number)
                    .e_tag(p.etag.clone())
                    .build()
            })
            .collect();

        let output = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(session_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                AppError::store_unavailable(format!("Failed to complete multipart session: {e}"))
            })?;

        Ok(ObjectDescriptor {
            key: key.to_string(),
            etag: output.e_tag().map(str::to_string),
            location: output.location().map(str::to_string),
        })
    }

    async fn abort_multipart(&self, key: &str, session_id: &str) -> AppResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(session_id)
            .send()
            .await
            .map_err(|e| {
                AppError::store_unavailable(format!("Failed to abort multipart session: {e}"))
            })?;

        Ok(())
    }
}
