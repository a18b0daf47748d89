//! Folder hierarchy engine: tree resolution and cascading soft-delete.
//!
//! Cascades acquire one transaction at this level and thread it through
//! every participating repository call; commit or rollback happens here
//! and nowhere deeper.

use std::collections::HashSet;
use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use nimbus_core::error::{AppError, ErrorKind};
use nimbus_core::result::AppResult;
use nimbus_database::repositories::file::FileRepository;
use nimbus_database::repositories::folder::FolderRepository;
use nimbus_entity::folder::{CreateFolder, Folder};

/// Manages the folder forest: creation, listing, search, reparenting,
/// subtree resolution, and cascading soft-delete/restore.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Pool used to open cascade transactions.
    pool: PgPool,
    /// Folder repository.
    folder_repo: Arc<FolderRepository>,
    /// File repository, the file-deletion collaborator for cascades.
    file_repo: Arc<FileRepository>,
}

/// Request to create a new folder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateFolderRequest {
    /// Parent folder ID (`None` for root-level).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        pool: PgPool,
        folder_repo: Arc<FolderRepository>,
        file_repo: Arc<FileRepository>,
    ) -> Self {
        Self {
            pool,
            folder_repo,
            file_repo,
        }
    }

    /// Gets a folder by ID. Absent and foreign-owned read the same.
    pub async fn get_folder(&self, folder_id: Uuid, owner_id: Uuid) -> AppResult<Folder> {
        self.folder_repo
            .find_by_id(folder_id, owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Creates a new folder under the given parent (root if omitted).
    ///
    /// The parent reference is stored as given. It is not checked for
    /// existence or ownership.
    pub async fn create_folder(
        &self,
        owner_id: Uuid,
        req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        if req.name.trim().is_empty() {
            return Err(AppError::validation("Folder name cannot be empty"));
        }

        let folder = self
            .folder_repo
            .create(&CreateFolder {
                owner_id,
                parent_id: req.parent_id,
                name: req.name,
            })
            .await?;

        info!(
            owner_id = %owner_id,
            folder_id = %folder.id,
            name = %folder.name,
            "Folder created"
        );

        Ok(folder)
    }

    /// Lists non-deleted direct children (`None` = root children).
    pub async fn list_children(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Folder>> {
        self.folder_repo.find_children(owner_id, parent_id).await
    }

    /// Case-insensitive substring search over the owner's non-deleted
    /// folders. Not tree-scoped.
    pub async fn search_by_name_fragment(
        &self,
        owner_id: Uuid,
        fragment: &str,
    ) -> AppResult<Vec<Folder>> {
        self.folder_repo
            .find_by_name_fragment(owner_id, fragment)
            .await
    }

    /// Partial update: renames and/or reparents a folder. Only supplied
    /// fields change; `new_parent_id` is two-level, `Some(None)` meaning
    /// "move to root".
    ///
    /// Returns the affected-count: 0 when the folder does not belong to
    /// the owner (silent, indistinguishable from absent). The reparent
    /// branch rejects a target inside the folder's own subtree so the
    /// forest stays acyclic.
    pub async fn rename_or_reparent(
        &self,
        folder_id: Uuid,
        owner_id: Uuid,
        new_name: Option<String>,
        new_parent_id: Option<Option<Uuid>>,
    ) -> AppResult<u64> {
        if let Some(name) = &new_name {
            if name.trim().is_empty() {
                return Err(AppError::validation("Folder name cannot be empty"));
            }
        }

        if let Some(Some(target_parent)) = new_parent_id {
            if target_parent == folder_id {
                return Err(AppError::constraint_violation(
                    "Cannot move a folder into itself",
                ));
            }
            let subtree = self.resolve_subtree(folder_id, owner_id).await?;
            if subtree.contains(&target_parent) {
                return Err(AppError::constraint_violation(
                    "Cannot move a folder into one of its descendants",
                ));
            }
        }

        let affected = self
            .folder_repo
            .rename_or_reparent(folder_id, owner_id, new_name.as_deref(), new_parent_id)
            .await?;

        if affected > 0 {
            info!(
                owner_id = %owner_id,
                folder_id = %folder_id,
                renamed = new_name.is_some(),
                reparented = new_parent_id.is_some(),
                "Folder updated"
            );
        }

        Ok(affected)
    }

    /// Resolves the inclusive descendant closure of one folder.
    pub async fn resolve_subtree(
        &self,
        root_id: Uuid,
        owner_id: Uuid,
    ) -> AppResult<HashSet<Uuid>> {
        self.resolve_subtree_many(&[root_id], owner_id).await
    }

    /// Resolves the inclusive descendant closure seeded from several roots
    /// at once (multi-select delete).
    pub async fn resolve_subtree_many(
        &self,
        root_ids: &[Uuid],
        owner_id: Uuid,
    ) -> AppResult<HashSet<Uuid>> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })?;
        self.folder_repo
            .resolve_descendants(&mut conn, root_ids, owner_id)
            .await
    }

    /// Soft-deletes the full subtrees of the given roots, and the files
    /// under every affected folder, in a single transaction. Rolls back
    /// entirely on any failure.
    ///
    /// Returns the number of folders newly tombstoned.
    pub async fn cascade_soft_delete(&self, root_ids: &[Uuid], owner_id: Uuid) -> AppResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let subtree = self
            .folder_repo
            .resolve_descendants(&mut tx, root_ids, owner_id)
            .await?;
        let ids: Vec<Uuid> = subtree.into_iter().collect();

        let folders = self
            .folder_repo
            .soft_delete_by_ids(&mut tx, &ids, owner_id)
            .await?;
        let files = self
            .file_repo
            .soft_delete_by_folder_ids(&mut tx, &ids, owner_id)
            .await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit cascade", e)
        })?;

        info!(
            owner_id = %owner_id,
            roots = root_ids.len(),
            folders,
            files,
            "Folder subtree soft-deleted"
        );

        Ok(folders)
    }

    /// Restores exactly the given folders and the files directly under
    /// them, in a single transaction. Deliberately NOT a subtree walk:
    /// deletion cascades downward, restoration does not. Descendants come
    /// back only when listed explicitly.
    ///
    /// Returns the number of folder rows touched.
    pub async fn cascade_restore(&self, folder_ids: &[Uuid], owner_id: Uuid) -> AppResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let folders = self
            .folder_repo
            .restore_by_ids(&mut tx, folder_ids, owner_id)
            .await?;
        let files = self
            .file_repo
            .restore_by_folder_ids(&mut tx, folder_ids, owner_id)
            .await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit restore", e)
        })?;

        info!(
            owner_id = %owner_id,
            folders,
            files,
            "Folders restored"
        );

        Ok(folders)
    }
}
