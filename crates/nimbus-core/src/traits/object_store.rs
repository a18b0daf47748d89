//! Object-store adapter trait for content-addressed blob storage.
//!
//! The upload coordinator never moves file bytes itself: it hands out
//! pre-signed URLs and forwards part checksums. Everything below the URL
//! (transport, retries, authentication of the PUT itself) belongs to the
//! store and the client.

use async_trait::async_trait;

use crate::result::AppResult;

/// One uploaded part of a multipart session, identified by its position
/// and the checksum the store returned for it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UploadPart {
    /// 1-based position of the part within the object.
    pub part_number: i32,
    /// Checksum (ETag) the store handed back when the part was uploaded.
    pub etag: String,
}

impl UploadPart {
    /// Create a new part descriptor.
    pub fn new(part_number: i32, etag: impl Into<String>) -> Self {
        Self {
            part_number,
            etag: etag.into(),
        }
    }
}

/// Descriptor of an assembled object returned by the store on completion.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ObjectDescriptor {
    /// The object key.
    pub key: String,
    /// Checksum of the assembled object, if the store reports one.
    pub etag: Option<String>,
    /// Store-specific location (URL) of the object, if reported.
    pub location: Option<String>,
}

/// Trait for object-store backends.
///
/// Defined here in `nimbus-core` and implemented in `nimbus-storage`.
/// All operations are idempotent at session-id granularity except
/// [`complete_multipart`](ObjectStore::complete_multipart), which consumes
/// the session; callers guard against double completion.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "s3", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether the store is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Issue a pre-signed URL for a single whole-object PUT.
    async fn presign_put(&self, key: &str, content_type: &str) -> AppResult<String>;

    /// Open a multipart session for the given key and return its session id.
    async fn create_multipart(&self, key: &str, content_type: &str) -> AppResult<String>;

    /// Issue a pre-signed URL for one part of an open multipart session.
    async fn presign_part(&self, key: &str, session_id: &str, part_number: i32)
    -> AppResult<String>;

    /// Assemble the object from the given parts and close the session.
    ///
    /// The store rejects gapped or out-of-order part lists; callers must
    /// pass parts sorted ascending and contiguous from 1.
    async fn complete_multipart(
        &self,
        key: &str,
        session_id: &str,
        parts: &[UploadPart],
    ) -> AppResult<ObjectDescriptor>;

    /// Abort an open multipart session and release its stored parts.
    async fn abort_multipart(&self, key: &str, session_id: &str) -> AppResult<()>;
}
