//! File repository implementation.
//!
//! Listing and search only surface visible files (`finished` and not
//! tombstoned). The folder-scoped batch mutations at the bottom are the
//! file-deletion collaborator surface used inside cascade transactions.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use nimbus_core::error::{AppError, ErrorKind};
use nimbus_core::result::AppResult;
use nimbus_entity::file::{CreateFile, File, UploadStatus};

/// Repository for file metadata and upload-state transitions.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new file record in `pending` state.
    pub async fn create(&self, data: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (id, owner_id, folder_id, name, mime_type, size_bytes, storage_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(data.id)
        .bind(data.owner_id)
        .bind(data.folder_id)
        .bind(&data.name)
        .bind(&data.mime_type)
        .bind(data.size_bytes)
        .bind(&data.storage_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create file", e))
    }

    /// Find a file by ID, scoped to its owner.
    pub async fn find_by_id(&self, id: Uuid, owner_id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// List visible files in a folder (`None` = owner's root).
    pub async fn find_by_folder(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE owner_id = $1 AND folder_id IS NOT DISTINCT FROM $2 \
               AND upload_status = 'finished' AND is_deleted = FALSE \
             ORDER BY name ASC",
        )
        .bind(owner_id)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    /// Case-insensitive substring search over visible files.
    pub async fn find_by_name_fragment(
        &self,
        owner_id: Uuid,
        fragment: &str,
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE owner_id = $1 AND name ILIKE $2 \
               AND upload_status = 'finished' AND is_deleted = FALSE \
             ORDER BY name ASC",
        )
        .bind(owner_id)
        .bind(format!("%{fragment}%"))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search files", e))
    }

    /// Record the object store's multipart session id on the file row.
    pub async fn set_multipart_session(
        &self,
        file_id: Uuid,
        owner_id: Uuid,
        session_id: &str,
    ) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET multipart_upload_id = $3, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 RETURNING *",
        )
        .bind(file_id)
        .bind(owner_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record session", e))?
        .ok_or_else(|| AppError::not_found("File not found"))
    }

    /// Flip a file to `finished` and fold away its session id.
    pub async fn mark_finished(&self, file_id: Uuid, owner_id: Uuid) -> AppResult<File> {
        self.set_status(file_id, owner_id, UploadStatus::Finished)
            .await
    }

    /// Flip a file to terminal `failed` and fold away its session id.
    pub async fn mark_failed(&self, file_id: Uuid, owner_id: Uuid) -> AppResult<File> {
        self.set_status(file_id, owner_id, UploadStatus::Failed)
            .await
    }

    async fn set_status(
        &self,
        file_id: Uuid,
        owner_id: Uuid,
        status: UploadStatus,
    ) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET upload_status = $3, multipart_upload_id = NULL, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 RETURNING *",
        )
        .bind(file_id)
        .bind(owner_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update upload status", e)
        })?
        .ok_or_else(|| AppError::not_found("File not found"))
    }

    /// Partial update: only supplied fields change. `new_folder_id` is
    /// two-level: `Some(None)` moves the file to the owner's root.
    ///
    /// Returns the affected-row count; 0 when the file does not belong
    /// to the owner.
    pub async fn rename_or_move(
        &self,
        file_id: Uuid,
        owner_id: Uuid,
        new_name: Option<&str>,
        new_folder_id: Option<Option<Uuid>>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE files SET \
                name = COALESCE($3, name), \
                folder_id = CASE WHEN $4 THEN $5 ELSE folder_id END, \
                updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(file_id)
        .bind(owner_id)
        .bind(new_name)
        .bind(new_folder_id.is_some())
        .bind(new_folder_id.flatten())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file", e))?;

        Ok(result.rows_affected())
    }

    /// Tombstone a single file. Returns the affected-row count.
    pub async fn soft_delete(&self, file_id: Uuid, owner_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE files SET is_deleted = TRUE, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND is_deleted = FALSE",
        )
        .bind(file_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;

        Ok(result.rows_affected())
    }

    /// Clear the tombstone on a single file. Returns the affected-row count.
    pub async fn restore(&self, file_id: Uuid, owner_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE files SET is_deleted = FALSE, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(file_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to restore file", e))?;

        Ok(result.rows_affected())
    }

    /// Tombstone every not-yet-deleted file under the given folders, on the
    /// caller's transaction. Part of the folder cascade.
    pub async fn soft_delete_by_folder_ids(
        &self,
        conn: &mut PgConnection,
        folder_ids: &[Uuid],
        owner_id: Uuid,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE files SET is_deleted = TRUE, updated_at = NOW() \
             WHERE folder_id = ANY($1) AND owner_id = $2 AND is_deleted = FALSE",
        )
        .bind(folder_ids)
        .bind(owner_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete folder files", e)
        })?;

        Ok(result.rows_affected())
    }

    /// Clear the tombstone on files under exactly the given folders, on the
    /// caller's transaction.
    pub async fn restore_by_folder_ids(
        &self,
        conn: &mut PgConnection,
        folder_ids: &[Uuid],
        owner_id: Uuid,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE files SET is_deleted = FALSE, updated_at = NOW() \
             WHERE folder_id = ANY($1) AND owner_id = $2",
        )
        .bind(folder_ids)
        .bind(owner_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to restore folder files", e)
        })?;

        Ok(result.rows_affected())
    }
}
