//! File metadata operations.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use nimbus_core::error::AppError;
use nimbus_core::result::AppResult;
use nimbus_database::repositories::file::FileRepository;
use nimbus_entity::file::File;

/// File metadata queries and single-file tombstone management.
///
/// Listing and search only surface visible files (finished and not
/// deleted). Folder-scoped bulk deletion lives in the hierarchy engine's
/// cascade, not here.
#[derive(Debug, Clone)]
pub struct FileService {
    /// File repository.
    file_repo: Arc<FileRepository>,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(file_repo: Arc<FileRepository>) -> Self {
        Self { file_repo }
    }

    /// Gets a file by ID. Absent and foreign-owned read the same.
    pub async fn get_file(&self, file_id: Uuid, owner_id: Uuid) -> AppResult<File> {
        self.file_repo
            .find_by_id(file_id, owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))
    }

    /// Lists visible files in a folder (`None` = owner's root).
    pub async fn list_files(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
    ) -> AppResult<Vec<File>> {
        self.file_repo.find_by_folder(owner_id, folder_id).await
    }

    /// Case-insensitive substring search over the owner's visible files.
    pub async fn search_by_name_fragment(
        &self,
        owner_id: Uuid,
        fragment: &str,
    ) -> AppResult<Vec<File>> {
        self.file_repo
            .find_by_name_fragment(owner_id, fragment)
            .await
    }

    /// Partial update: renames and/or moves a file. Only supplied fields
    /// change; `new_folder_id` is two-level, `Some(None)` meaning "move to
    /// root". Returns the affected-count, 0 on owner mismatch.
    pub async fn rename_or_move(
        &self,
        file_id: Uuid,
        owner_id: Uuid,
        new_name: Option<String>,
        new_folder_id: Option<Option<Uuid>>,
    ) -> AppResult<u64> {
        if let Some(name) = &new_name {
            if name.trim().is_empty() {
                return Err(AppError::validation("File name cannot be empty"));
            }
        }

        let affected = self
            .file_repo
            .rename_or_move(file_id, owner_id, new_name.as_deref(), new_folder_id)
            .await?;

        if affected > 0 {
            info!(owner_id = %owner_id, file_id = %file_id, "File updated");
        }

        Ok(affected)
    }

    /// Tombstones a single file, independent of any folder cascade.
    pub async fn soft_delete(&self, file_id: Uuid, owner_id: Uuid) -> AppResult<u64> {
        let affected = self.file_repo.soft_delete(file_id, owner_id).await?;
        if affected > 0 {
            info!(owner_id = %owner_id, file_id = %file_id, "File soft-deleted");
        }
        Ok(affected)
    }

    /// Clears the tombstone on a single file.
    pub async fn restore(&self, file_id: Uuid, owner_id: Uuid) -> AppResult<u64> {
        let affected = self.file_repo.restore(file_id, owner_id).await?;
        if affected > 0 {
            info!(owner_id = %owner_id, file_id = %file_id, "File restored");
        }
        Ok(affected)
    }
}
