//! Integration tests for the upload session coordinator.

mod common;

use uuid::Uuid;

use nimbus_core::error::ErrorKind;
use nimbus_core::traits::object_store::UploadPart;
use nimbus_entity::file::UploadStatus;
use nimbus_service::file::{InitiateUploadRequest, UploadTarget};

fn request(folder_id: Option<Uuid>, name: &str, size_bytes: i64) -> InitiateUploadRequest {
    InitiateUploadRequest {
        folder_id,
        name: name.to_string(),
        mime_type: "application/pdf".to_string(),
        size_bytes,
    }
}

/// 50 MB, above the default 5 MB multipart threshold.
const LARGE: i64 = 50_000_000;
/// Well below the threshold.
const SMALL: i64 = 1000;

#[tokio::test]
async fn test_initiate_chooses_target_by_threshold() {
    let Some(pool) = common::test_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (uploads, store) = common::upload_service(&pool);
    let owner = common::owner();

    let resp = uploads
        .initiate(owner, request(None, "report.pdf", LARGE))
        .await
        .unwrap();
    assert_eq!(resp.file.upload_status, UploadStatus::Pending);
    match &resp.target {
        UploadTarget::Multipart { session_id, .. } => {
            assert_eq!(
                resp.file.multipart_upload_id.as_deref(),
                Some(session_id.as_str())
            );
        }
        UploadTarget::Direct { .. } => panic!("expected a multipart target for a 50 MB file"),
    }
    assert_eq!(store.open_session_count().await, 1);

    let resp = uploads
        .initiate(owner, request(None, "note.txt", SMALL))
        .await
        .unwrap();
    match &resp.target {
        UploadTarget::Direct { put_url } => assert!(put_url.starts_with("memory://")),
        UploadTarget::Multipart { .. } => panic!("expected a direct target for a 1000-byte file"),
    }
    assert!(resp.file.multipart_upload_id.is_none());
    assert_eq!(store.open_session_count().await, 1);
}

#[tokio::test]
async fn test_complete_accepts_out_of_order_parts() {
    let Some(pool) = common::test_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (uploads, store) = common::upload_service(&pool);
    let owner = common::owner();

    let resp = uploads
        .initiate(owner, request(None, "big.bin", LARGE))
        .await
        .unwrap();
    let file_id = resp.file.id;

    let url = uploads.chunk_upload_target(file_id, owner, 1).await.unwrap();
    assert!(url.starts_with("memory://part/"));
    uploads.chunk_upload_target(file_id, owner, 2).await.unwrap();

    // Parts arrive in reverse completion order; the coordinator reorders
    // them before talking to the store.
    let parts = vec![UploadPart::new(2, "e2"), UploadPart::new(1, "e1")];
    let file = uploads.complete(file_id, owner, parts).await.unwrap();

    assert_eq!(file.upload_status, UploadStatus::Finished);
    assert!(file.multipart_upload_id.is_none());
    assert!(store.object_exists(&file.storage_key).await);
    assert_eq!(store.assembly_count().await, 1);
    assert_eq!(store.open_session_count().await, 0);
}

#[tokio::test]
async fn test_complete_twice_is_idempotent() {
    let Some(pool) = common::test_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (uploads, store) = common::upload_service(&pool);
    let owner = common::owner();

    let resp = uploads
        .initiate(owner, request(None, "big.bin", LARGE))
        .await
        .unwrap();
    let file_id = resp.file.id;
    uploads.chunk_upload_target(file_id, owner, 1).await.unwrap();

    let parts = vec![UploadPart::new(1, "e1")];
    uploads.complete(file_id, owner, parts.clone()).await.unwrap();

    // Second call with the same parts: no second assembly at the store.
    let file = uploads.complete(file_id, owner, parts).await.unwrap();
    assert_eq!(file.upload_status, UploadStatus::Finished);
    assert_eq!(store.assembly_count().await, 1);
}

#[tokio::test]
async fn test_complete_rejects_gapped_parts_and_stays_retriable() {
    let Some(pool) = common::test_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (uploads, store) = common::upload_service(&pool);
    let files = common::file_service(&pool);
    let owner = common::owner();

    let resp = uploads
        .initiate(owner, request(None, "big.bin", LARGE))
        .await
        .unwrap();
    let file_id = resp.file.id;
    uploads.chunk_upload_target(file_id, owner, 1).await.unwrap();
    uploads.chunk_upload_target(file_id, owner, 2).await.unwrap();

    let gapped = vec![UploadPart::new(1, "e1"), UploadPart::new(3, "e3")];
    let err = uploads.complete(file_id, owner, gapped).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);

    // The row is untouched; resubmitting a valid list succeeds.
    let file = files.get_file(file_id, owner).await.unwrap();
    assert_eq!(file.upload_status, UploadStatus::Pending);
    assert_eq!(store.assembly_count().await, 0);

    let parts = vec![UploadPart::new(1, "e1"), UploadPart::new(2, "e2")];
    let file = uploads.complete(file_id, owner, parts).await.unwrap();
    assert_eq!(file.upload_status, UploadStatus::Finished);
}

#[tokio::test]
async fn test_store_rejection_leaves_file_pending() {
    let Some(pool) = common::test_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (uploads, store) = common::upload_service(&pool);
    let files = common::file_service(&pool);
    let owner = common::owner();

    let resp = uploads
        .initiate(owner, request(None, "big.bin", LARGE))
        .await
        .unwrap();
    let file_id = resp.file.id;
    uploads.chunk_upload_target(file_id, owner, 1).await.unwrap();

    // Part 2 was never issued: the list is contiguous, so normalization
    // passes and the store itself rejects the completion.
    let parts = vec![UploadPart::new(1, "e1"), UploadPart::new(2, "e2")];
    let err = uploads.complete(file_id, owner, parts).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::StoreUnavailable);

    let file = files.get_file(file_id, owner).await.unwrap();
    assert_eq!(file.upload_status, UploadStatus::Pending);

    // Upload the missing part and retry the same completion.
    uploads.chunk_upload_target(file_id, owner, 2).await.unwrap();
    let parts = vec![UploadPart::new(1, "e1"), UploadPart::new(2, "e2")];
    let file = uploads.complete(file_id, owner, parts).await.unwrap();
    assert_eq!(file.upload_status, UploadStatus::Finished);
    assert_eq!(store.assembly_count().await, 1);
}

#[tokio::test]
async fn test_abort_semantics() {
    let Some(pool) = common::test_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (uploads, store) = common::upload_service(&pool);
    let files = common::file_service(&pool);
    let owner = common::owner();

    // Aborting a pending multipart upload releases the session and the
    // file becomes terminal failed, invisible to listing.
    let resp = uploads
        .initiate(owner, request(None, "doomed.bin", LARGE))
        .await
        .unwrap();
    let file_id = resp.file.id;

    let file = uploads.abort(file_id, owner).await.unwrap();
    assert_eq!(file.upload_status, UploadStatus::Failed);
    assert_eq!(store.open_session_count().await, 0);
    assert!(files.list_files(owner, None).await.unwrap().is_empty());

    // A completion after abort is rejected.
    let parts = vec![UploadPart::new(1, "e1")];
    let err = uploads.complete(file_id, owner, parts).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);

    // Aborting again is a no-op.
    let file = uploads.abort(file_id, owner).await.unwrap();
    assert_eq!(file.upload_status, UploadStatus::Failed);

    // Aborting a finished file is a no-op too.
    let resp = uploads
        .initiate(owner, request(None, "kept.txt", SMALL))
        .await
        .unwrap();
    let finished = uploads.finish_direct(resp.file.id, owner).await.unwrap();
    let file = uploads.abort(finished.id, owner).await.unwrap();
    assert_eq!(file.upload_status, UploadStatus::Finished);
}

#[tokio::test]
async fn test_finish_direct_flow() {
    let Some(pool) = common::test_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (uploads, _store) = common::upload_service(&pool);
    let files = common::file_service(&pool);
    let owner = common::owner();

    let resp = uploads
        .initiate(owner, request(None, "note.txt", SMALL))
        .await
        .unwrap();
    let file_id = resp.file.id;

    // Pending files are invisible to listing.
    assert!(files.list_files(owner, None).await.unwrap().is_empty());

    let file = uploads.finish_direct(file_id, owner).await.unwrap();
    assert_eq!(file.upload_status, UploadStatus::Finished);
    assert_eq!(files.list_files(owner, None).await.unwrap().len(), 1);

    // Idempotent.
    let file = uploads.finish_direct(file_id, owner).await.unwrap();
    assert_eq!(file.upload_status, UploadStatus::Finished);

    // A multipart file cannot take the direct shortcut.
    let resp = uploads
        .initiate(owner, request(None, "big.bin", LARGE))
        .await
        .unwrap();
    let err = uploads.finish_direct(resp.file.id, owner).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_owner_mismatch_reads_not_found() {
    let Some(pool) = common::test_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (uploads, _store) = common::upload_service(&pool);
    let files = common::file_service(&pool);
    let owner = common::owner();
    let stranger = common::owner();

    let resp = uploads
        .initiate(owner, request(None, "big.bin", LARGE))
        .await
        .unwrap();
    let file_id = resp.file.id;

    let err = files.get_file(file_id, stranger).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = uploads
        .chunk_upload_target(file_id, stranger, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let parts = vec![UploadPart::new(1, "e1")];
    let err = uploads.complete(file_id, stranger, parts).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = uploads.abort(file_id, stranger).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_chunk_target_requires_pending_multipart() {
    let Some(pool) = common::test_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (uploads, _store) = common::upload_service(&pool);
    let owner = common::owner();

    // Direct-upload files have no session to issue parts for.
    let resp = uploads
        .initiate(owner, request(None, "note.txt", SMALL))
        .await
        .unwrap();
    let err = uploads
        .chunk_upload_target(resp.file.id, owner, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);

    // Part numbers start at 1.
    let resp = uploads
        .initiate(owner, request(None, "big.bin", LARGE))
        .await
        .unwrap();
    let err = uploads
        .chunk_upload_target(resp.file.id, owner, 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    // Aborted uploads issue no further targets.
    uploads.abort(resp.file.id, owner).await.unwrap();
    let err = uploads
        .chunk_upload_target(resp.file.id, owner, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_initiate_validation() {
    let Some(pool) = common::test_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (uploads, _store) = common::upload_service(&pool);
    let owner = common::owner();

    let err = uploads
        .initiate(owner, request(None, "  ", SMALL))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = uploads
        .initiate(owner, request(None, "neg.bin", -1))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_file_search_and_rename() {
    let Some(pool) = common::test_pool().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (uploads, _store) = common::upload_service(&pool);
    let files = common::file_service(&pool);
    let owner = common::owner();

    let resp = uploads
        .initiate(owner, request(None, "Quarterly Report.pdf", SMALL))
        .await
        .unwrap();
    uploads.finish_direct(resp.file.id, owner).await.unwrap();

    let found = files.search_by_name_fragment(owner, "report").await.unwrap();
    assert_eq!(found.len(), 1);

    let affected = files
        .rename_or_move(resp.file.id, owner, Some("Annual Report.pdf".to_string()), None)
        .await
        .unwrap();
    assert_eq!(affected, 1);

    assert!(
        files
            .search_by_name_fragment(owner, "quarterly")
            .await
            .unwrap()
            .is_empty()
    );

    // Independent tombstone and restore on one file.
    assert_eq!(files.soft_delete(resp.file.id, owner).await.unwrap(), 1);
    assert!(files.list_files(owner, None).await.unwrap().is_empty());
    assert_eq!(files.restore(resp.file.id, owner).await.unwrap(), 1);
    assert_eq!(files.list_files(owner, None).await.unwrap().len(), 1);
}
