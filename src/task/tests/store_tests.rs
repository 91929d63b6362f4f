//! Tests for the in-memory task store.

use super::support::request;
use crate::artifact::domain::OptimizationResult;
use crate::task::adapters::memory::InMemoryTaskStore;
use crate::task::domain::{Task, TaskStatus};
use crate::task::ports::{TaskStore, TaskStoreError};
use chrono::Duration;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn store() -> InMemoryTaskStore {
    InMemoryTaskStore::new()
}

fn queued() -> Task {
    Task::new(request(), &DefaultClock)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn admission_stops_at_capacity(store: InMemoryTaskStore) {
    for _ in 0..2 {
        store.admit(&queued(), 2).await.expect("slot available");
    }
    let rejected = queued();

    let outcome = store.admit(&rejected, 2).await;

    assert!(
        matches!(outcome, Err(TaskStoreError::CapacityExceeded { capacity: 2 })),
        "{outcome:?}"
    );
    assert!(
        store
            .find_by_id(rejected.id())
            .await
            .expect("lookup succeeds")
            .is_none()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn finished_tasks_free_their_slot(store: InMemoryTaskStore) {
    let clock = DefaultClock;
    let mut first = queued();
    store.admit(&first, 1).await.expect("slot available");
    first.start(&clock).expect("queued task starts");
    first
        .complete(OptimizationResult::default(), &clock)
        .expect("running task completes");
    store.update(&first).await.expect("task exists");

    let outcome = store.admit(&queued(), 1).await;

    assert!(outcome.is_ok(), "{outcome:?}");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_ids_are_rejected(store: InMemoryTaskStore) {
    let task = queued();
    store.admit(&task, 4).await.expect("slot available");

    let outcome = store.admit(&task, 4).await;

    assert!(
        matches!(outcome, Err(TaskStoreError::DuplicateTask(id)) if id == task.id()),
        "{outcome:?}"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn updating_an_unknown_task_fails(store: InMemoryTaskStore) {
    let task = queued();

    let outcome = store.update(&task).await;

    assert!(
        matches!(outcome, Err(TaskStoreError::NotFound(id)) if id == task.id()),
        "{outcome:?}"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn eviction_removes_only_old_finished_tasks(store: InMemoryTaskStore) {
    let clock = DefaultClock;
    let waiting = queued();
    let mut finished = queued();
    store.admit(&waiting, 4).await.expect("slot available");
    store.admit(&finished, 4).await.expect("slot available");
    finished.start(&clock).expect("queued task starts");
    finished
        .complete(OptimizationResult::default(), &clock)
        .expect("running task completes");
    store.update(&finished).await.expect("task exists");
    let completed_at = finished.completed_at().expect("completion time");

    let early = store
        .evict_finished_before(completed_at)
        .await
        .expect("sweep succeeds");
    let late = store
        .evict_finished_before(
            completed_at
                .checked_add_signed(Duration::seconds(1))
                .expect("representable time"),
        )
        .await
        .expect("sweep succeeds");

    assert_eq!(early, 0);
    assert_eq!(late, 1);
    let counts = store.counts().await.expect("counts succeed");
    assert_eq!(counts.queued, 1);
    assert_eq!(counts.done, 0);
    assert_eq!(
        store
            .find_by_id(waiting.id())
            .await
            .expect("lookup succeeds")
            .map(|task| task.status()),
        Some(TaskStatus::Queued)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removed_tasks_are_gone(store: InMemoryTaskStore) {
    let task = queued();
    store.admit(&task, 4).await.expect("slot available");

    let removed = store.remove(task.id()).await.expect("remove succeeds");

    assert_eq!(removed.map(|found| found.id()), Some(task.id()));
    assert!(
        store
            .find_by_id(task.id())
            .await
            .expect("lookup succeeds")
            .is_none()
    );
}
