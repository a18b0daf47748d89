//! Folder repository implementation.
//!
//! Every query is owner-scoped: a folder belonging to another owner is
//! invisible here, including during subtree resolution.

use std::collections::HashSet;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use nimbus_core::error::{AppError, ErrorKind};
use nimbus_core::result::AppResult;
use nimbus_entity::folder::{CreateFolder, Folder};

/// Repository for folder CRUD, search, and subtree queries.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a folder by ID, scoped to its owner.
    pub async fn find_by_id(&self, id: Uuid, owner_id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Create a new folder. The parent reference is stored as given,
    /// whether or not it resolves to an existing folder.
    pub async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (id, owner_id, parent_id, name) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.owner_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create folder", e))
    }

    /// List non-deleted direct children of a folder (`None` = root children).
    pub async fn find_children(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 AND is_deleted = FALSE \
             ORDER BY name ASC",
        )
        .bind(owner_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    /// Case-insensitive substring search over non-deleted folders.
    pub async fn find_by_name_fragment(
        &self,
        owner_id: Uuid,
        fragment: &str,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE owner_id = $1 AND name ILIKE $2 AND is_deleted = FALSE \
             ORDER BY name ASC",
        )
        .bind(owner_id)
        .bind(format!("%{fragment}%"))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search folders", e))
    }

    /// Partial update: only supplied fields change. `new_parent_id` is
    /// two-level: `Some(None)` reparents to the owner's root, `None`
    /// leaves the parent untouched.
    ///
    /// Returns the affected-row count; 0 when the folder does not belong
    /// to the owner.
    pub async fn rename_or_reparent(
        &self,
        folder_id: Uuid,
        owner_id: Uuid,
        new_name: Option<&str>,
        new_parent_id: Option<Option<Uuid>>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE folders SET \
                name = COALESCE($3, name), \
                parent_id = CASE WHEN $4 THEN $5 ELSE parent_id END, \
                updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(folder_id)
        .bind(owner_id)
        .bind(new_name)
        .bind(new_parent_id.is_some())
        .bind(new_parent_id.flatten())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update folder", e))?;

        Ok(result.rows_affected())
    }

    /// Resolve the inclusive descendant closure of the given seed folders.
    ///
    /// A fixed-point walk over the parent edge: start from the seeds that
    /// actually belong to the owner, repeatedly pull in folders whose parent
    /// is already accepted, stop when a pass adds nothing. The accepted set
    /// guards termination on any finite edge set regardless of depth, and
    /// the owner filter is applied at the seed AND at every expansion step,
    /// so an id coincidence across owners never enters the closure.
    /// Tombstoned folders participate like any other.
    ///
    /// Takes a connection so cascades can run it on their own transaction.
    pub async fn resolve_descendants(
        &self,
        conn: &mut PgConnection,
        seed_ids: &[Uuid],
        owner_id: Uuid,
    ) -> AppResult<HashSet<Uuid>> {
        let mut accepted: HashSet<Uuid> = HashSet::new();

        let seeds: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM folders WHERE id = ANY($1) AND owner_id = $2")
                .bind(seed_ids)
                .bind(owner_id)
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to resolve seed folders", e)
                })?;

        let mut frontier: Vec<Uuid> = seeds
            .into_iter()
            .filter(|id| accepted.insert(*id))
            .collect();

        while !frontier.is_empty() {
            let children: Vec<Uuid> = sqlx::query_scalar(
                "SELECT id FROM folders WHERE parent_id = ANY($1) AND owner_id = $2",
            )
            .bind(&frontier)
            .bind(owner_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to expand folder subtree", e)
            })?;

            frontier = children
                .into_iter()
                .filter(|id| accepted.insert(*id))
                .collect();
        }

        Ok(accepted)
    }

    /// Tombstone every not-yet-deleted folder in `ids`, on the caller's
    /// transaction. Returns the number of folders newly marked deleted.
    pub async fn soft_delete_by_ids(
        &self,
        conn: &mut PgConnection,
        ids: &[Uuid],
        owner_id: Uuid,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE folders SET is_deleted = TRUE, updated_at = NOW() \
             WHERE id = ANY($1) AND owner_id = $2 AND is_deleted = FALSE",
        )
        .bind(ids)
        .bind(owner_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete folders", e))?;

        Ok(result.rows_affected())
    }

    /// Clear the tombstone on exactly the given folders, on the caller's
    /// transaction. No subtree walk happens here.
    pub async fn restore_by_ids(
        &self,
        conn: &mut PgConnection,
        ids: &[Uuid],
        owner_id: Uuid,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE folders SET is_deleted = FALSE, updated_at = NOW() \
             WHERE id = ANY($1) AND owner_id = $2",
        )
        .bind(ids)
        .bind(owner_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to restore folders", e))?;

        Ok(result.rows_affected())
    }
}
