//! Object-store and upload configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Object-store provider to use: `"s3"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Maximum upload size in bytes (default 5 GB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Uploads at or above this size use a multipart session instead of a
    /// single pre-signed PUT (default 5 MB).
    #[serde(default = "default_multipart_threshold")]
    pub multipart_threshold_bytes: u64,
    /// Suggested size of each part in a multipart upload (default 5 MB).
    #[serde(default = "default_part_size")]
    pub part_size_bytes: u64,
    /// Lifetime of issued pre-signed URLs in seconds (default 15 minutes).
    /// Expiry is enforced by the URL itself, not tracked server-side.
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_seconds: u64,
    /// S3-compatible object-store settings.
    #[serde(default)]
    pub s3: S3Config,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            max_upload_size_bytes: default_max_upload(),
            multipart_threshold_bytes: default_multipart_threshold(),
            part_size_bytes: default_part_size(),
            presign_expiry_seconds: default_presign_expiry(),
            s3: S3Config::default(),
        }
    }
}

/// S3-compatible object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 endpoint URL (empty for AWS, set for MinIO and friends).
    #[serde(default)]
    pub endpoint: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// S3 bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Access key ID. When empty, the ambient credential chain is used.
    #[serde(default)]
    pub access_key: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_key: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_max_upload() -> u64 {
    5_368_709_120 // 5 GB
}

fn default_multipart_threshold() -> u64 {
    5_242_880 // 5 MB
}

fn default_part_size() -> u64 {
    5_242_880 // 5 MB
}

fn default_presign_expiry() -> u64 {
    900
}

fn default_region() -> String {
    "us-east-1".to_string()
}
