//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle status of a file's upload.
///
/// A file is created `Pending`, becomes `Finished` once the object store has
/// confirmed assembly, and `Failed` when the upload is aborted. `Failed` is
/// terminal; the row remains soft-deletable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "upload_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Upload initiated; content not yet assembled in the object store.
    Pending,
    /// Content assembled and confirmed by the object store.
    Finished,
    /// Upload aborted or irrecoverably failed.
    Failed,
}

impl UploadStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file stored in Nimbus.
///
/// The upload session is not persisted separately: `multipart_upload_id`
/// holds the object store's session id while an upload is open and is
/// cleared when the session is folded into the row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// The file owner.
    pub owner_id: Uuid,
    /// The folder containing this file (`None` = owner's root). A weak
    /// reference: the folder is not required to exist.
    pub folder_id: Option<Uuid>,
    /// The file name (including extension).
    pub name: String,
    /// MIME type of the file.
    pub mime_type: String,
    /// File size in bytes as declared at initiation.
    pub size_bytes: i64,
    /// Current upload status.
    pub upload_status: UploadStatus,
    /// The object key in the blob store.
    pub storage_key: String,
    /// Open multipart session id at the object store, if any.
    pub multipart_upload_id: Option<String>,
    /// Soft-delete tombstone.
    pub is_deleted: bool,
    /// When the file record was created.
    pub created_at: DateTime<Utc>,
    /// When the file record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Whether the file shows up in listing and search.
    pub fn is_visible(&self) -> bool {
        self.upload_status == UploadStatus::Finished && !self.is_deleted
    }

    /// Whether an object-store multipart session is currently open.
    pub fn has_open_session(&self) -> bool {
        self.multipart_upload_id.is_some()
    }
}

/// Data required to create a new file record.
///
/// The id is generated by the caller so the object key can embed it before
/// the row exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// Unique file identifier.
    pub id: Uuid,
    /// The file owner.
    pub owner_id: Uuid,
    /// The folder to place the file in (`None` = owner's root).
    pub folder_id: Option<Uuid>,
    /// The file name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Declared file size in bytes.
    pub size_bytes: i64,
    /// The object key in the blob store.
    pub storage_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(UploadStatus::Pending.as_str(), "pending");
        assert_eq!(UploadStatus::Finished.as_str(), "finished");
        assert_eq!(UploadStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&UploadStatus::Finished).expect("serialize");
        assert_eq!(json, "\"finished\"");
        let parsed: UploadStatus = serde_json::from_str("\"pending\"").expect("deserialize");
        assert_eq!(parsed, UploadStatus::Pending);
    }
}
