//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A folder in an owner's file hierarchy.
///
/// Folders form a forest per owner: `parent_id = None` means the folder sits
/// at that owner's root. Deletion is a tombstone flag, never a row removal.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: Uuid,
    /// The folder owner. Every lookup is scoped to this.
    pub owner_id: Uuid,
    /// Parent folder ID (`None` for root-level folders).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
    /// Soft-delete tombstone.
    pub is_deleted: bool,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root-level folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// The folder owner.
    pub owner_id: Uuid,
    /// Parent folder (`None` for root). Not validated against the owner's
    /// existing folders; a dangling parent reference is accepted.
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
}
