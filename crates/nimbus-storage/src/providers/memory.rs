//! In-memory object store.
//!
//! Keeps the real store's contract observable in-process: sessions are
//! opened, parts must be issued before they can appear in a completion,
//! a gapped or unordered part list is rejected, and completion consumes
//! the session. No bytes are held; clients "upload" out of band against
//! the fake URLs this provider hands out.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use nimbus_core::error::AppError;
use nimbus_core::result::AppResult;
use nimbus_core::traits::object_store::{ObjectDescriptor, ObjectStore, UploadPart};

/// In-process object store for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Open multipart sessions by session id.
    sessions: HashMap<String, Session>,
    /// Assembled objects by key.
    objects: HashMap<String, StoredObject>,
    /// Number of successful assemblies performed.
    assemblies: u64,
}

#[derive(Debug)]
struct Session {
    key: String,
    content_type: String,
    issued_parts: BTreeSet<i32>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    content_type: String,
    part_count: usize,
}

impl MemoryObjectStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an assembled object exists under the given key.
    pub async fn object_exists(&self, key: &str) -> bool {
        self.inner.lock().await.objects.contains_key(key)
    }

    /// Number of multipart sessions currently open.
    pub async fn open_session_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    /// Number of assemblies performed since creation. Lets callers assert
    /// that an idempotent re-completion did not re-assemble.
    pub async fn assembly_count(&self) -> u64 {
        self.inner.lock().await.assemblies
    }

    /// Content type and part count of an assembled object, if present.
    pub async fn object_meta(&self, key: &str) -> Option<(String, usize)> {
        self.inner
            .lock()
            .await
            .objects
            .get(key)
            .map(|o| (o.content_type.clone(), o.part_count))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn presign_put(&self, key: &str, content_type: &str) -> AppResult<String> {
        // The direct PUT happens out of band; record the object as present
        // so single-object uploads are observable like multipart ones.
        let mut inner = self.inner.lock().await;
        inner.objects.insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                part_count: 1,
            },
        );
        Ok(format!("memory://put/{key}"))
    }

    async fn create_multipart(&self, key: &str, content_type: &str) -> AppResult<String> {
        let session_id = Uuid::new_v4().to_string();
        let mut inner = self.inner.lock().await;
        inner.sessions.insert(
            session_id.clone(),
            Session {
                key: key.to_string(),
                content_type: content_type.to_string(),
                issued_parts: BTreeSet::new(),
            },
        );
        debug!(key, session_id, "Opened multipart session");
        Ok(session_id)
    }

    async fn presign_part(
        &self,
        key: &str,
        session_id: &str,
        part_number: i32,
    ) -> AppResult<String> {
        let mut inner = self.inner.lock().await;
        let session = inner
            .sessions
            .get_mut(session_id)
            .filter(|s| s.key == key)
            .ok_or_else(|| AppError::store_unavailable("Unknown multipart session"))?;
        session.issued_parts.insert(part_number);
        Ok(format!("memory://part/{session_id}/{part_number}"))
    }

    async fn complete_multipart(
        &self,
        key: &str,
        session_id: &str,
        parts: &[UploadPart],
    ) -> AppResult<ObjectDescriptor> {
        let mut inner = self.inner.lock().await;
        let session = inner
            .sessions
            .get(session_id)
            .filter(|s| s.key == key)
            .ok_or_else(|| AppError::store_unavailable("Unknown or consumed multipart session"))?;

        if parts.is_empty() {
            return Err(AppError::store_unavailable("Empty part list"));
        }
        for (index, part) in parts.iter().enumerate() {
            if part.part_number != (index + 1) as i32 {
                return Err(AppError::store_unavailable(
                    "Part list must be ascending and contiguous from 1",
                ));
            }
            if !session.issued_parts.contains(&part.part_number) {
                return Err(AppError::store_unavailable(format!(
                    "Part {} was never uploaded",
                    part.part_number
                )));
            }
        }

        let content_type = session.content_type.clone();
        inner.sessions.remove(session_id);
        inner.objects.insert(
            key.to_string(),
            StoredObject {
                content_type,
                part_count: parts.len(),
            },
        );
        inner.assemblies += 1;
        debug!(key, session_id, parts = parts.len(), "Assembled object");

        Ok(ObjectDescriptor {
            key: key.to_string(),
            etag: Some(format!("mem-{}", parts.len())),
            location: Some(format!("memory://{key}")),
        })
    }

    async fn abort_multipart(&self, key: &str, session_id: &str) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        let matches = inner
            .sessions
            .get(session_id)
            .map(|s| s.key == key)
            .unwrap_or(false);
        if matches {
            inner.sessions.remove(session_id);
            debug!(key, session_id, "Aborted multipart session");
        }
        // Aborting an unknown or already-consumed session is a no-op.
        Ok(())
    }
}
