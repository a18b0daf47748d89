//! # nimbus-storage
//!
//! Object-store implementations for Nimbus: an S3-compatible provider
//! (behind the `s3` feature) and an in-memory provider used by tests and
//! local development.

use std::sync::Arc;

use nimbus_core::config::storage::StorageConfig;
use nimbus_core::error::AppError;
use nimbus_core::result::AppResult;
use nimbus_core::traits::ObjectStore;

pub mod providers;

pub use providers::memory::MemoryObjectStore;
#[cfg(feature = "s3")]
pub use providers::s3::S3ObjectStore;

/// Build the configured object-store provider.
pub async fn build(config: &StorageConfig) -> AppResult<Arc<dyn ObjectStore>> {
    match config.provider.as_str() {
        "memory" => Ok(Arc::new(MemoryObjectStore::new())),
        #[cfg(feature = "s3")]
        "s3" => {
            let store = S3ObjectStore::new(&config.s3, config.presign_expiry_seconds).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "s3"))]
        "s3" => Err(AppError::configuration(
            "S3 provider requested but the `s3` feature is not enabled",
        )),
        other => Err(AppError::configuration(format!(
            "Unknown object-store provider: {other}"
        ))),
    }
}
