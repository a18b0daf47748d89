//! Upload session coordinator.
//!
//! Drives a file from `pending` through N independently-uploaded parts to
//! one assembled object. The coordinator never buffers bytes: it hands
//! out pre-signed URLs and forwards part checksums, while content flows
//! directly from the client to the object store.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use nimbus_core::config::storage::StorageConfig;
use nimbus_core::error::AppError;
use nimbus_core::result::AppResult;
use nimbus_core::traits::object_store::{ObjectStore, UploadPart};
use nimbus_database::repositories::file::FileRepository;
use nimbus_entity::file::{CreateFile, File, UploadStatus};

/// Coordinates the upload state machine from initiation to completion or
/// abort.
#[derive(Debug, Clone)]
pub struct UploadService {
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Object store the content is uploaded to.
    store: Arc<dyn ObjectStore>,
    /// Storage configuration (thresholds, part size).
    config: StorageConfig,
}

/// Request for initiating an upload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InitiateUploadRequest {
    /// Target folder ID (`None` = owner's root). A weak reference, stored
    /// as given.
    pub folder_id: Option<Uuid>,
    /// File name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Declared file size in bytes.
    pub size_bytes: i64,
}

/// Where the client should send the bytes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UploadTarget {
    /// Whole object in one pre-signed PUT; no session involved.
    Direct {
        /// Pre-signed PUT URL.
        put_url: String,
    },
    /// Chunked upload through an open multipart session.
    Multipart {
        /// The object store's session id.
        session_id: String,
        /// Suggested part size in bytes.
        part_size_bytes: u64,
    },
}

/// Response from initiating an upload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InitiateUploadResponse {
    /// The created file record, in `pending` state.
    pub file: File,
    /// Upload target the client should use.
    pub target: UploadTarget,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        file_repo: Arc<FileRepository>,
        store: Arc<dyn ObjectStore>,
        config: StorageConfig,
    ) -> Self {
        Self {
            file_repo,
            store,
            config,
        }
    }

    /// Initiates an upload: creates the `pending` file row first (so a
    /// file id always exists to key the session), then asks the store for
    /// either a single pre-signed PUT or a multipart session, chosen by
    /// the configured size threshold.
    pub async fn initiate(
        &self,
        owner_id: Uuid,
        req: InitiateUploadRequest,
    ) -> AppResult<InitiateUploadResponse> {
        if req.name.trim().is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }
        if req.size_bytes < 0 {
            return Err(AppError::validation("File size cannot be negative"));
        }
        if req.size_bytes as u64 > self.config.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds maximum upload size of {} bytes",
                self.config.max_upload_size_bytes
            )));
        }

        let file_id = Uuid::new_v4();
        let record = CreateFile {
            id: file_id,
            owner_id,
            folder_id: req.folder_id,
            name: req.name,
            mime_type: req.mime_type,
            size_bytes: req.size_bytes,
            storage_key: object_key(owner_id, file_id),
        };
        let file = self.file_repo.create(&record).await?;

        if req.size_bytes as u64 >= self.config.multipart_threshold_bytes {
            let session_id = self
                .store
                .create_multipart(&file.storage_key, &file.mime_type)
                .await?;
            let file = self
                .file_repo
                .set_multipart_session(file.id, owner_id, &session_id)
                .await?;

            info!(
                owner_id = %owner_id,
                file_id = %file.id,
                session_id = %session_id,
                size = file.size_bytes,
                "Multipart upload initiated"
            );

            Ok(InitiateUploadResponse {
                file,
                target: UploadTarget::Multipart {
                    session_id,
                    part_size_bytes: self.config.part_size_bytes,
                },
            })
        } else {
            let put_url = self
                .store
                .presign_put(&file.storage_key, &file.mime_type)
                .await?;

            info!(
                owner_id = %owner_id,
                file_id = %file.id,
                size = file.size_bytes,
                "Direct upload initiated"
            );

            Ok(InitiateUploadResponse {
                file,
                target: UploadTarget::Direct { put_url },
            })
        }
    }

    /// Issues one more pre-signed part URL inside an already-open
    /// multipart session. Stateless beyond the ownership and state checks.
    pub async fn chunk_upload_target(
        &self,
        file_id: Uuid,
        owner_id: Uuid,
        part_number: i32,
    ) -> AppResult<String> {
        if part_number < 1 {
            return Err(AppError::validation("Part numbers start at 1"));
        }

        let file = self.require_file(file_id, owner_id).await?;
        if file.upload_status != UploadStatus::Pending {
            return Err(AppError::invalid_state("Upload is no longer pending"));
        }
        let session_id = file
            .multipart_upload_id
            .as_deref()
            .ok_or_else(|| AppError::invalid_state("File has no open multipart session"))?;

        self.store
            .presign_part(&file.storage_key, session_id, part_number)
            .await
    }

    /// Completes a multipart upload: normalizes the part list, asks the
    /// store to assemble, and flips the file to `finished`.
    ///
    /// Calling this again after success is a no-op returning the
    /// already-finished file; the store is not contacted a second time.
    /// A store rejection leaves the row `pending`, so the call is safely
    /// retriable with the same parts.
    pub async fn complete(
        &self,
        file_id: Uuid,
        owner_id: Uuid,
        parts: Vec<UploadPart>,
    ) -> AppResult<File> {
        let file = self.require_file(file_id, owner_id).await?;
        match file.upload_status {
            UploadStatus::Finished => return Ok(file),
            UploadStatus::Failed => {
                return Err(AppError::invalid_state("Upload was aborted"));
            }
            UploadStatus::Pending => {}
        }

        let session_id = file
            .multipart_upload_id
            .as_deref()
            .ok_or_else(|| AppError::invalid_state("File has no open multipart session"))?;

        let parts = normalize_parts(parts)?;
        let descriptor = self
            .store
            .complete_multipart(&file.storage_key, session_id, &parts)
            .await?;

        let file = self.file_repo.mark_finished(file_id, owner_id).await?;

        info!(
            owner_id = %owner_id,
            file_id = %file_id,
            parts = parts.len(),
            etag = descriptor.etag.as_deref().unwrap_or(""),
            "Upload completed"
        );

        Ok(file)
    }

    /// Finishes a direct (single-PUT) upload after the client has stored
    /// the object. Idempotent on already-finished files; rejected for
    /// multipart files, which carry a part list through
    /// [`complete`](Self::complete).
    pub async fn finish_direct(&self, file_id: Uuid, owner_id: Uuid) -> AppResult<File> {
        let file = self.require_file(file_id, owner_id).await?;
        match file.upload_status {
            UploadStatus::Finished => return Ok(file),
            UploadStatus::Failed => {
                return Err(AppError::invalid_state("Upload was aborted"));
            }
            UploadStatus::Pending => {}
        }
        if file.has_open_session() {
            return Err(AppError::invalid_state(
                "Multipart uploads are completed with their part list",
            ));
        }

        let file = self.file_repo.mark_finished(file_id, owner_id).await?;
        info!(owner_id = %owner_id, file_id = %file_id, "Direct upload finished");
        Ok(file)
    }

    /// Aborts an upload. A `pending` file becomes terminal `failed`; a
    /// file already in a terminal state is returned unchanged.
    ///
    /// The store-side session release is best-effort: an abandoned
    /// session may cost storage, but cancellation never fails the caller.
    pub async fn abort(&self, file_id: Uuid, owner_id: Uuid) -> AppResult<File> {
        let file = self.require_file(file_id, owner_id).await?;
        if file.upload_status != UploadStatus::Pending {
            return Ok(file);
        }

        if let Some(session_id) = file.multipart_upload_id.as_deref() {
            if let Err(e) = self
                .store
                .abort_multipart(&file.storage_key, session_id)
                .await
            {
                warn!(
                    owner_id = %owner_id,
                    file_id = %file_id,
                    error = %e,
                    "Object-store abort failed; releasing the session is deferred to the store"
                );
            }
        }

        let file = self.file_repo.mark_failed(file_id, owner_id).await?;
        info!(owner_id = %owner_id, file_id = %file_id, "Upload aborted");
        Ok(file)
    }

    async fn require_file(&self, file_id: Uuid, owner_id: Uuid) -> AppResult<File> {
        self.file_repo
            .find_by_id(file_id, owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))
    }
}

/// Object key layout: one object per file, namespaced by owner.
fn object_key(owner_id: Uuid, file_id: Uuid) -> String {
    format!("{owner_id}/{file_id}")
}

/// Sort parts by part number, then require the list to be exactly
/// `1..=N` with no duplicates. The store rejects anything else, so the
/// coordinator enforces the precondition instead of assuming it from the
/// caller.
fn normalize_parts(mut parts: Vec<UploadPart>) -> AppResult<Vec<UploadPart>> {
    if parts.is_empty() {
        return Err(AppError::invalid_state("Part list is empty"));
    }

    parts.sort_by_key(|p| p.part_number);

    for (index, part) in parts.iter().enumerate() {
        let expected = (index + 1) as i32;
        if part.part_number != expected {
            return Err(AppError::invalid_state(format!(
                "Part list must be contiguous from 1; expected part {expected}, got {}",
                part.part_number
            )));
        }
    }

    Ok(parts)
}
