//! Integration tests for the account eraser.
//!
//! Covers full erasure across every owned collection, atomicity of the
//! document batch, idempotent re-invocation, blob prefix purging, and the
//! unauthenticated classification.

mod common;

use td_core::error::{TdError, TdResult};
use td_functions::eraser::{AuthContext, EraserService};
use td_functions::event_bus::StoreEvent;

fn make_eraser() -> (EraserService, td_store::Database, td_store::BlobStore, tempfile::TempDir) {
    let (db, blobs, dir) = common::create_test_env();
    let eraser = EraserService::new(db.clone(), blobs.clone(), common::create_test_event_bus());
    (eraser, db, blobs, dir)
}

#[tokio::test]
async fn erase_removes_every_owned_document() {
    let (eraser, db, _blobs, _dir) = make_eraser();
    let seeded = common::seed_user_data(&db, "u1");
    // Another user's data must survive untouched
    let other = common::seed_user_data(&db, "u2");

    let auth = AuthContext::new("u1");
    let summary = eraser.delete_user_data(Some(&auth)).await.unwrap();

    assert_eq!(summary.documents_staged, seeded);
    assert_eq!(summary.documents_removed, seeded);

    let stats = db.stats().unwrap();
    assert_eq!(stats.total() as usize, other);
    assert!(db
        .get_document(&td_store::paths::user_doc("u1").unwrap())
        .unwrap()
        .is_none());
    assert!(db
        .get_document(&td_store::paths::user_doc("u2").unwrap())
        .unwrap()
        .is_some());
    assert!(db.list_collection("users/u1/medicines").unwrap().is_empty());
    assert!(db
        .list_collection("iFeelConversations/u1-c1/messages")
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn erase_is_idempotent() {
    let (eraser, db, _blobs, _dir) = make_eraser();
    common::seed_user_data(&db, "u1");

    let auth = AuthContext::new("u1");
    let first = eraser.delete_user_data(Some(&auth)).await.unwrap();
    assert!(first.documents_removed > 0);

    // Re-invoking succeeds and removes nothing further
    let second = eraser.delete_user_data(Some(&auth)).await.unwrap();
    assert_eq!(second.documents_removed, 0);
    assert_eq!(second.objects_removed, 0);
}

#[tokio::test]
async fn erase_purges_blob_prefixes() {
    let (eraser, _db, blobs, _dir) = make_eraser();
    blobs.put_object("users/u1/avatar.png", b"png").unwrap();
    blobs.put_object("voice/u1/note.m4a", b"audio").unwrap();
    blobs
        .put_object("voice_messages/u1/vm1.m4a", b"audio")
        .unwrap();
    blobs.put_object("users/u2/avatar.png", b"png").unwrap();

    let auth = AuthContext::new("u1");
    let summary = eraser.delete_user_data(Some(&auth)).await.unwrap();

    assert_eq!(summary.objects_removed, 3);
    assert!(blobs.list_prefix("users/u1/").unwrap().is_empty());
    assert!(blobs.list_prefix("voice/u1/").unwrap().is_empty());
    assert!(blobs.list_prefix("voice_messages/u1/").unwrap().is_empty());
    // Other users' objects survive
    assert_eq!(blobs.list_prefix("users/u2/").unwrap().len(), 1);
}

#[tokio::test]
async fn unauthenticated_call_is_classified_before_any_work() {
    let (eraser, db, _blobs, _dir) = make_eraser();
    let seeded = common::seed_user_data(&db, "u1");

    let err = eraser.delete_user_data(None).await.unwrap_err();
    assert_eq!(err.code(), "unauthenticated");

    // Nothing was touched
    assert_eq!(db.stats().unwrap().total() as usize, seeded);
}

#[tokio::test]
async fn plan_enumerates_nested_messages_and_root_doc() {
    let (eraser, db, _blobs, _dir) = make_eraser();
    common::seed_user_data(&db, "u1");

    let plan = eraser.plan("u1").unwrap();
    let staged: Vec<&str> = plan.staged().iter().map(|p| p.as_str()).collect();

    assert!(staged.contains(&"iFeelConversations/u1-c1/messages/u1-c1-m1"));
    assert!(staged.contains(&"iFeelConversations/u1-c1"));
    assert!(staged.contains(&"caregivers/u1-cg1"));
    assert!(staged.contains(&"caregiver_invitations/u1-inv1"));
    // The root document is staged last
    assert_eq!(staged.last().copied(), Some("users/u1"));
}

#[tokio::test]
async fn failure_mid_batch_leaves_state_unchanged() {
    let (eraser, db, _blobs, _dir) = make_eraser();
    let seeded = common::seed_user_data(&db, "u1");

    // Replay the commit inside a transaction that fails after the deletes:
    // the rollback must restore every staged document.
    let plan = eraser.plan("u1").unwrap();
    let result: TdResult<()> = db.transaction(|conn| {
        for path in plan.staged() {
            conn.execute("DELETE FROM documents WHERE path = ?1", [path.as_str()])
                .map_err(|e| TdError::Database(e.to_string()))?;
        }
        Err(TdError::Database("injected failure".into()))
    });

    assert!(result.is_err());
    assert_eq!(db.stats().unwrap().total() as usize, seeded);
}

#[tokio::test]
async fn erase_emits_user_erased_event() {
    let (db, blobs, _dir) = common::create_test_env();
    let bus = common::create_test_event_bus();
    let eraser = EraserService::new(db.clone(), blobs, bus.clone());
    common::seed_user_data(&db, "u1");

    let mut rx = bus.subscribe();
    let auth = AuthContext::new("u1");
    let summary = eraser.delete_user_data(Some(&auth)).await.unwrap();

    let event = rx.recv().await.unwrap();
    match event {
        StoreEvent::UserErased {
            user_id,
            documents_removed,
            ..
        } => {
            assert_eq!(user_id, "u1");
            assert_eq!(documents_removed, summary.documents_removed);
        }
        _ => panic!("expected UserErased event"),
    }
}
