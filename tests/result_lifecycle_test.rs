//! Task result and group lifecycle properties across both store
//! implementations, plus expiration sweeping against SQLite.

use std::sync::Arc;

use chrono::Utc;
use tally_backend::{BackendError, ExpirationSweeper, GroupCoordinator, ResultStore, TaskState};
use tally_core::TaskMeta;
use tally_integration_tests::{all_stores, test_id};
use tally_storage::{CoordinationStore, SqliteStore, StoreError};

#[tokio::test]
async fn never_stored_task_reads_as_pending() {
    for (label, store) in all_stores().await {
        let results = ResultStore::new(store);
        let lookup = results.get_task_meta("unseen").await.unwrap();
        assert!(!lookup.is_stored(), "store {}", label);
        assert_eq!(lookup.meta().state, TaskState::Pending);
    }
}

#[tokio::test]
async fn store_then_read_round_trips() {
    for (label, store) in all_stores().await {
        let results = ResultStore::new(store);
        let task_id = test_id("task");
        results
            .store_result(&task_id, TaskState::Success, Some(b"\"r\"".to_vec()), None)
            .await
            .unwrap();

        let meta = results.get_task_meta(&task_id).await.unwrap().into_meta();
        assert_eq!(meta.state, TaskState::Success, "store {}", label);
        assert_eq!(meta.result.as_deref(), Some(b"\"r\"".as_slice()));
    }
}

#[tokio::test]
async fn forget_then_read_reverts_to_pending() {
    for (label, store) in all_stores().await {
        let results = ResultStore::new(store);
        let task_id = test_id("task");
        results
            .store_result(&task_id, TaskState::Success, Some(b"1".to_vec()), None)
            .await
            .unwrap();
        results.forget(&task_id).await.unwrap();

        let lookup = results.get_task_meta(&task_id).await.unwrap();
        assert!(!lookup.is_stored(), "store {}", label);
        assert_eq!(lookup.meta().state, TaskState::Pending);
    }
}

#[tokio::test]
async fn group_restores_children_in_saved_order() {
    for (label, store) in all_stores().await {
        let groups = GroupCoordinator::new(store);
        let children: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        groups.save_group("g1", children.clone()).await.unwrap();

        assert_eq!(
            groups.restore_group("g1").await.unwrap(),
            Some(children),
            "store {}",
            label
        );
    }
}

#[tokio::test]
async fn group_results_reconstruct_positionally() {
    // Group ["t1", "t2"] with t1 = SUCCESS(2), t2 = SUCCESS(3): walking the
    // restored manifest through the result store yields [2, 3].
    for (label, store) in all_stores().await {
        let groups = GroupCoordinator::new(store.clone());
        let results = ResultStore::new(store);

        groups
            .save_group("g1", vec!["t1".to_string(), "t2".to_string()])
            .await
            .unwrap();
        results
            .store_result("t1", TaskState::Success, Some(b"2".to_vec()), None)
            .await
            .unwrap();
        results
            .store_result("t2", TaskState::Success, Some(b"3".to_vec()), None)
            .await
            .unwrap();

        let mut values = Vec::new();
        for child in groups.restore_group("g1").await.unwrap().unwrap() {
            let meta = results.get_task_meta(&child).await.unwrap().into_meta();
            let value: i64 = serde_json::from_slice(&meta.result.unwrap()).unwrap();
            values.push(value);
        }
        assert_eq!(values, vec![2, 3], "store {}", label);
    }
}

#[tokio::test]
async fn poll_during_outage_errors_instead_of_pending() {
    // A caller polling while the store is unreachable must see the failure,
    // not a lookup that passes for a task that never ran
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let results = ResultStore::new(store.clone());
    store.close().await.unwrap();

    let err = results.get_task_meta("t1").await.unwrap_err();
    match err {
        BackendError::Store(inner) => {
            assert!(matches!(inner, StoreError::Unavailable(_)), "{inner}");
            assert!(inner.is_retryable());
        }
        other => panic!("expected a store error, got {other}"),
    }
}

#[tokio::test]
async fn sweep_removes_only_records_older_than_ttl() {
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let sweeper = ExpirationSweeper::new(store.clone());

    let mut expired = TaskMeta::pending("expired");
    expired.date_done = Some(Utc::now() - chrono::Duration::hours(2));
    store.upsert_task(&expired).await.unwrap();

    let mut live = TaskMeta::pending("live");
    live.date_done = Some(Utc::now());
    store.upsert_task(&live).await.unwrap();

    let report = sweeper
        .cleanup(std::time::Duration::from_secs(3600))
        .await
        .unwrap();
    assert_eq!(report.tasks, 1);

    // Written after the sweep started: untouched by that sweep
    assert!(store.fetch_task("live").await.unwrap().is_some());
    assert!(store.fetch_task("expired").await.unwrap().is_none());

    // Nothing left in the window: a second pass removes nothing
    let report = sweeper
        .cleanup(std::time::Duration::from_secs(3600))
        .await
        .unwrap();
    assert_eq!(report.total(), 0);
}
