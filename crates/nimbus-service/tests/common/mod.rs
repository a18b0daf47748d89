//! Shared helpers for live-database integration tests.
//!
//! Tests need a PostgreSQL instance reachable via `DATABASE_URL`; when the
//! variable is unset they skip instead of failing. Every test works under a
//! fresh random owner, so no cleanup between tests is required.

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use nimbus_core::config::DatabaseConfig;
use nimbus_core::config::logging::LoggingConfig;
use nimbus_core::config::storage::StorageConfig;
use nimbus_database::DatabasePool;
use nimbus_database::repositories::file::FileRepository;
use nimbus_database::repositories::folder::FolderRepository;
use nimbus_service::{FileService, FolderService, UploadService};
use nimbus_storage::MemoryObjectStore;

/// Connect to the test database and run migrations, or `None` when no
/// `DATABASE_URL` is configured.
pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    nimbus_core::logging::init_tracing(&LoggingConfig::default());

    let db = DatabasePool::connect(&DatabaseConfig::with_url(url))
        .await
        .expect("connect to test database");
    assert!(db.health_check().await.expect("health check"));

    let pool = db.into_pool();
    nimbus_database::migration::run_migrations(&pool)
        .await
        .expect("run migrations");
    Some(pool)
}

/// Build a folder service over the given pool.
pub fn folder_service(pool: &PgPool) -> FolderService {
    FolderService::new(
        pool.clone(),
        Arc::new(FolderRepository::new(pool.clone())),
        Arc::new(FileRepository::new(pool.clone())),
    )
}

/// Build a file service over the given pool.
pub fn file_service(pool: &PgPool) -> FileService {
    FileService::new(Arc::new(FileRepository::new(pool.clone())))
}

/// Build an upload service backed by an in-memory object store, returning
/// the store too so tests can observe sessions and assemblies.
pub fn upload_service(pool: &PgPool) -> (UploadService, Arc<MemoryObjectStore>) {
    let store = Arc::new(MemoryObjectStore::new());
    let service = UploadService::new(
        Arc::new(FileRepository::new(pool.clone())),
        store.clone(),
        StorageConfig::default(),
    );
    (service, store)
}

/// A fresh owner id, isolating the test from every other test's data.
pub fn owner() -> Uuid {
    Uuid::new_v4()
}
