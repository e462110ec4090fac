//! Progress tracker behaviour against real store implementations
//!
//! Covers the unlock-order, duplicate-rejection and completion properties and
//! the full submit scenario.

use async_trait::async_trait;
use bingo_common::roster::is_admin_or_deny;
use bingo_common::store::{InMemoryStore, LocalStateStore, SqliteStore};
use bingo_common::{
    AdminRosterEntry, NewSubmission, Principal, ProgressTracker, Scope, StateError, StoreError,
    Submission, SubmissionStore, SubmitError, Symbol, TrackerState, SEQUENCE,
};
use proptest::prelude::*;

/// Store that is always unreachable
struct UnavailableStore;

#[async_trait]
impl SubmissionStore for UnavailableStore {
    async fn insert_submission(&self, _record: NewSubmission) -> Result<Submission, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn list_submissions(&self, _scope: Option<&Scope>) -> Result<Vec<Submission>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn clear_submissions(&self, _scope: Option<&Scope>) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn list_admins(&self) -> Result<Vec<AdminRosterEntry>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

async fn run_scenario<S: SubmissionStore>(store: &S) {
    let mut tracker = ProgressTracker::new(Scope::Local);

    let first = tracker
        .submit(store, "https://x.com/alice/status/123", None)
        .await
        .unwrap();
    assert_eq!(first.symbol, Symbol::B);
    assert_eq!(first.identity, "@alice");
    assert_eq!(first.sequence_index, 1);

    let err = tracker
        .submit(store, "https://x.com/alice/status/123", None)
        .await
        .unwrap_err();
    assert_eq!(err, SubmitError::State(StateError::DuplicateReference));

    let second = tracker
        .submit(store, "https://x.com/bob/status/456", None)
        .await
        .unwrap();
    assert_eq!(second.symbol, Symbol::A);
    assert_eq!(second.identity, "@bob");

    tracker
        .submit(store, "https://twitter.com/carol/status/789", None)
        .await
        .unwrap();
    assert!(!tracker.is_complete());
    tracker
        .submit(store, "https://www.x.com/dave/status/1011", None)
        .await
        .unwrap();
    assert!(tracker.is_complete());

    let err = tracker
        .submit(store, "https://x.com/erin/status/1213", None)
        .await
        .unwrap_err();
    assert_eq!(err, SubmitError::State(StateError::AlreadyComplete));

    let stored = store.list_submissions(Some(&Scope::Local)).await.unwrap();
    assert_eq!(stored.len(), 4);
    let letters: String = stored.iter().map(|s| s.symbol.as_char()).collect();
    assert_eq!(letters, "BASE");

    // A reloaded tracker agrees with the live one
    let reloaded = ProgressTracker::load(store, Scope::Local).await.unwrap();
    assert_eq!(reloaded.progress(), tracker.progress());
}

#[tokio::test]
async fn test_scenario_in_memory() {
    run_scenario(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_scenario_sqlite() {
    let store = SqliteStore::memory().await.unwrap();
    run_scenario(&store).await;
}

/// Two trackers loaded before either writes, as two concurrent requests would be
async fn run_stale_trackers<S: SubmissionStore>(store: &S) {
    let mut a = ProgressTracker::load(store, Scope::Local).await.unwrap();
    let mut b = ProgressTracker::load(store, Scope::Local).await.unwrap();

    let first = a
        .submit(store, "https://x.com/alice/status/1", None)
        .await
        .unwrap();
    let second = b
        .submit(store, "https://x.com/bob/status/2", None)
        .await
        .unwrap();
    assert_eq!((first.symbol, first.sequence_index), (Symbol::B, 1));
    assert_eq!((second.symbol, second.sequence_index), (Symbol::A, 2));
    assert_eq!(b.unlocked_count(), 2);

    // `a` has not seen bob's post yet
    let err = a
        .submit(store, "https://x.com/bob/status/2", None)
        .await
        .unwrap_err();
    assert_eq!(err, SubmitError::State(StateError::DuplicateReference));
    assert_eq!(a.unlocked_count(), 2);

    a.submit(store, "https://x.com/carol/status/3", None)
        .await
        .unwrap();
    a.submit(store, "https://x.com/dave/status/4", None)
        .await
        .unwrap();
    assert!(a.is_complete());

    let err = b
        .submit(store, "https://x.com/erin/status/5", None)
        .await
        .unwrap_err();
    assert_eq!(err, SubmitError::State(StateError::AlreadyComplete));
    assert!(b.is_complete());

    let stored = store.list_submissions(Some(&Scope::Local)).await.unwrap();
    let letters: String = stored.iter().map(|s| s.symbol.as_char()).collect();
    assert_eq!(letters, "BASE");
    let indexes: Vec<u32> = stored.iter().map(|s| s.sequence_index).collect();
    assert_eq!(indexes, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_stale_trackers_in_memory() {
    run_stale_trackers(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_stale_trackers_sqlite() {
    let store = SqliteStore::memory().await.unwrap();
    run_stale_trackers(&store).await;
}

#[tokio::test]
async fn test_stale_trackers_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStateStore::open(dir.path().join("storage.json")).await;
    run_stale_trackers(&store).await;
}

#[tokio::test]
async fn test_already_complete_checked_before_duplicate() {
    let store = InMemoryStore::new();
    let mut tracker = ProgressTracker::new(Scope::Local);
    for i in 0..4 {
        tracker
            .submit(&store, &format!("https://x.com/a/status/{}", i), None)
            .await
            .unwrap();
    }

    let err = tracker
        .submit(&store, "https://x.com/a/status/0", None)
        .await
        .unwrap_err();
    assert_eq!(err, SubmitError::State(StateError::AlreadyComplete));
}

#[tokio::test]
async fn test_unavailable_store_is_recoverable() {
    let store = UnavailableStore;
    let mut tracker = ProgressTracker::new(Scope::Local);

    let err = tracker
        .submit(&store, "https://x.com/alice/status/1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Store(StoreError::Unavailable(_))));
    assert_eq!(tracker.state(), TrackerState::Empty);

    assert!(ProgressTracker::load(&store, Scope::Local).await.is_err());
}

#[tokio::test]
async fn test_admin_check_degrades_to_not_admin() {
    let principal = Principal::Fid(348330);
    assert!(!is_admin_or_deny(&UnavailableStore, Some(&principal)).await);

    let store = InMemoryStore::new();
    assert!(is_admin_or_deny(&store, Some(&principal)).await);
    assert!(!is_admin_or_deny(&store, Some(&Principal::Fid(1))).await);
    assert!(!is_admin_or_deny(&store, None).await);
}

#[derive(Debug, Clone)]
enum Attempt {
    Fresh(u32),
    Repeat(usize),
    Invalid(String),
}

fn attempt_strategy() -> impl Strategy<Value = Attempt> {
    prop_oneof![
        (0u32..1000).prop_map(Attempt::Fresh),
        (0usize..8).prop_map(Attempt::Repeat),
        "[a-z./:]{0,30}".prop_map(Attempt::Invalid),
    ]
}

proptest! {
    #[test]
    fn prop_unlocked_symbols_are_always_a_prefix(attempts in prop::collection::vec(attempt_strategy(), 0..12)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let store = InMemoryStore::new();
            let mut tracker = ProgressTracker::new(Scope::Local);
            let mut used: Vec<String> = Vec::new();

            for attempt in attempts {
                let reference = match attempt {
                    Attempt::Fresh(id) => format!("https://x.com/p/status/{}", id),
                    Attempt::Repeat(i) if !used.is_empty() => used[i % used.len()].clone(),
                    Attempt::Repeat(_) => continue,
                    Attempt::Invalid(s) => s,
                };

                let before = tracker.progress();
                match tracker.submit(&store, &reference, None).await {
                    Ok(submission) => {
                        used.push(submission.reference.clone());
                        prop_assert_eq!(tracker.unlocked_count(), before.unlocked_count + 1);
                    }
                    Err(SubmitError::State(StateError::AlreadyComplete)) => {
                        prop_assert!(before.complete);
                        prop_assert_eq!(tracker.progress(), before);
                    }
                    Err(_) => prop_assert_eq!(tracker.progress(), before),
                }

                let unlocked = tracker.unlocked_symbols();
                prop_assert_eq!(&unlocked[..], &SEQUENCE[..unlocked.len()]);
            }
            Ok(())
        })?;
    }
}
