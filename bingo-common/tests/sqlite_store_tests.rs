//! SQLite store tests
//!
//! Uses in-memory databases, plus one file database to exercise
//! `init_database` and reopening.

use bingo_common::store::SqliteStore;
use bingo_common::{
    AdminRoster, AdminRosterEntry, NewSubmission, Principal, RosterStore, Scope, StoreError,
    SubmissionStore, Symbol, DEFAULT_ADMIN_FID,
};

fn record(scope: Scope, reference: &str, symbol: Symbol, index: u32) -> NewSubmission {
    NewSubmission {
        scope,
        reference: reference.to_string(),
        symbol,
        identity: "@alice".to_string(),
        sequence_index: index,
    }
}

#[tokio::test]
async fn test_insert_and_list_round_trip() {
    let store = SqliteStore::memory().await.unwrap();

    let inserted = store
        .insert_submission(record(Scope::Principal(7), "https://x.com/alice/status/1", Symbol::B, 1))
        .await
        .unwrap();

    let listed = store.list_submissions(Some(&Scope::Principal(7))).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, inserted.id);
    assert_eq!(listed[0].symbol, Symbol::B);
    assert_eq!(listed[0].scope, Scope::Principal(7));
    assert_eq!(listed[0].sequence_index, 1);
    assert_eq!(
        listed[0].created_at.timestamp_millis(),
        inserted.created_at.timestamp_millis()
    );

    assert!(store.list_submissions(Some(&Scope::Local)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unique_constraint_is_duplicate_key() {
    let store = SqliteStore::memory().await.unwrap();
    let url = "https://x.com/alice/status/1";

    store
        .insert_submission(record(Scope::Local, url, Symbol::B, 1))
        .await
        .unwrap();
    let err = store
        .insert_submission(record(Scope::Local, url, Symbol::A, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(_)), "got {:?}", err);

    // Uniqueness is per scope
    store
        .insert_submission(record(Scope::Principal(1), url, Symbol::B, 1))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_repeated_position_is_duplicate_key() {
    let store = SqliteStore::memory().await.unwrap();

    store
        .insert_submission(record(Scope::Local, "https://x.com/alice/status/1", Symbol::B, 1))
        .await
        .unwrap();
    let err = store
        .insert_submission(record(Scope::Local, "https://x.com/bob/status/2", Symbol::B, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(_)), "got {:?}", err);
    assert_eq!(store.list_submissions(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_is_ordered_oldest_first() {
    let store = SqliteStore::memory().await.unwrap();
    for (i, symbol) in [Symbol::B, Symbol::A, Symbol::S].iter().enumerate() {
        store
            .insert_submission(record(
                Scope::Local,
                &format!("https://x.com/alice/status/{}", i),
                *symbol,
                i as u32 + 1,
            ))
            .await
            .unwrap();
    }

    let all = store.list_submissions(None).await.unwrap();
    let order: Vec<u32> = all.iter().map(|s| s.sequence_index).collect();
    assert_eq!(order, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_clear_submissions() {
    let store = SqliteStore::memory().await.unwrap();
    store
        .insert_submission(record(Scope::Local, "https://x.com/a/status/1", Symbol::B, 1))
        .await
        .unwrap();
    store
        .insert_submission(record(Scope::Principal(2), "https://x.com/a/status/1", Symbol::B, 1))
        .await
        .unwrap();

    assert_eq!(store.clear_submissions(Some(&Scope::Principal(2))).await.unwrap(), 1);
    assert_eq!(store.list_submissions(None).await.unwrap().len(), 1);
    assert_eq!(store.clear_submissions(None).await.unwrap(), 1);
    assert!(store.list_submissions(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_roster_seeded_and_saved() {
    let store = SqliteStore::memory().await.unwrap();

    assert_eq!(store.load_roster().await.unwrap(), AdminRoster::default());
    assert!(store
        .is_admin_principal(&Principal::Fid(DEFAULT_ADMIN_FID))
        .await
        .unwrap());

    let mut roster = store.load_roster().await.unwrap();
    roster
        .add_admin(AdminRosterEntry::new(Principal::Handle("ops".to_string()), "Ops"))
        .unwrap();
    roster.add_admin(AdminRosterEntry::fid(42)).unwrap();
    roster.remove_admin(&Principal::Fid(DEFAULT_ADMIN_FID)).unwrap();
    store.save_roster(&roster).await.unwrap();

    let admins = store.list_admins().await.unwrap();
    let principals: Vec<String> = admins.iter().map(|a| a.principal.to_string()).collect();
    assert_eq!(principals, vec!["@ops", "fid:42"]);
    assert!(!store
        .is_admin_principal(&Principal::Fid(DEFAULT_ADMIN_FID))
        .await
        .unwrap());
    assert!(store
        .is_admin_principal(&Principal::Handle("ops".to_string()))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("bingo.db");

    {
        let store = SqliteStore::open(&db_path).await.unwrap();
        store
            .insert_submission(record(Scope::Local, "https://x.com/a/status/1", Symbol::B, 1))
            .await
            .unwrap();
        store.pool().close().await;
    }

    assert!(db_path.exists());
    let store = SqliteStore::open(&db_path).await.unwrap();
    assert_eq!(store.list_submissions(None).await.unwrap().len(), 1);
    assert_eq!(store.list_admins().await.unwrap().len(), 1);
}
