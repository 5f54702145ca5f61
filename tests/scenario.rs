//! End-to-end behavior of the cache, hierarchy and drag pipeline against an
//! in-memory backend.

use std::sync::Arc;

use tasktree::adapters::memory::{MemoryBackend, MemoryTable};
use tasktree::api::TaskApi;
use tasktree::drag::DropTarget;
use tasktree::ports::{Method, RowTable};
use tasktree::view::TableSession;

fn session(backend: &Arc<MemoryBackend>) -> TableSession {
    TableSession::new(TaskApi::new(backend.clone()), Some(9))
}

fn chain() -> Arc<MemoryBackend> {
    // 1 <- 2 <- 3, plus an unrelated root 4.
    Arc::new(
        MemoryBackend::new()
            .with_task(1, 9, None)
            .with_task(2, 9, Some(1))
            .with_task(3, 9, Some(2))
            .with_task(4, 9, None),
    )
}

#[tokio::test]
async fn children_are_ordered_under_parents_with_depths() {
    let backend = Arc::new(MemoryBackend::new().with_task(1, 9, None).with_task(2, 9, Some(1)).with_task(3, 9, None));
    let s = session(&backend);
    let mut table = MemoryTable::from_task_ids(&[2, 1, 3]);

    assert!(s.on_table_mutation(&mut table).await.unwrap());

    assert_eq!(table.order(), vec![1, 2, 3]);
    assert_eq!(table.depth_of(1), Some(0));
    assert_eq!(table.depth_of(2), Some(1));
    assert_eq!(table.depth_of(3), Some(0));
}

#[tokio::test]
async fn repeated_resolves_share_one_round() {
    let backend = Arc::new(MemoryBackend::new().with_task(5, 1, None).with_task(7, 1, None));
    let s = session(&backend);

    s.fetcher().resolve(&[5, 5, 7]).await.unwrap();
    s.fetcher().resolve(&[5]).await.unwrap();

    assert_eq!(backend.count(Method::Get, "/api/v1/tasks/all"), 1);
}

#[tokio::test]
async fn missing_ids_end_after_one_empty_round() {
    let backend = Arc::new(MemoryBackend::new().with_task(1, 9, None).with_task(2, 9, None));
    let s = session(&backend);

    let resolved = s.fetcher().resolve(&[1, 2, 3]).await.unwrap();

    assert!(resolved[0].is_some() && resolved[1].is_some());
    assert!(resolved[2].is_none());
    assert_eq!(backend.count(Method::Get, "/api/v1/tasks/all"), 2);
}

#[tokio::test]
async fn depth_stops_at_project_boundary() {
    let backend =
        Arc::new(MemoryBackend::new().with_task(1, 9, None).with_task(2, 4, Some(1)).with_task(3, 9, Some(2)));
    let s = session(&backend);

    assert_eq!(s.resolver().depth(1).await.unwrap(), 0);
    assert_eq!(s.resolver().depth(3).await.unwrap(), 0);
}

#[tokio::test]
async fn second_reorder_moves_nothing() {
    let backend = chain();
    let s = session(&backend);
    let mut table = MemoryTable::from_task_ids(&[3, 4, 2, 1]);

    s.refresh(&mut table).await.unwrap();
    table.reset_moves();
    let moved = s.refresh(&mut table).await.unwrap();

    assert_eq!(moved, 0);
    assert_eq!(table.moves(), 0);
}

#[tokio::test]
async fn dropping_onto_descendant_issues_no_mutation() {
    let backend = chain();
    let mut s = session(&backend);
    let mut table = MemoryTable::from_task_ids(&[1, 2, 3, 4]);
    s.refresh(&mut table).await.unwrap();
    table.select_tasks(&[1]);
    let rows = table.rows();

    assert!(s.begin_drag(&table, rows[0]));
    assert!(!s.accepts(&table, DropTarget::Row(rows[2])).await.unwrap());
    let report = s.drop_on(&mut table, DropTarget::Row(rows[2])).await.unwrap();

    assert!(report.moved.is_empty());
    assert_eq!(backend.count(Method::Put, "/api/v1/tasks/"), 0);
    assert_eq!(backend.count(Method::Delete, "/api/v1/tasks/"), 0);
}

#[tokio::test]
async fn dragging_parent_and_child_mutates_only_the_parent() {
    let backend = chain();
    let mut s = session(&backend);
    let mut table = MemoryTable::from_task_ids(&[1, 2, 3, 4]);
    s.refresh(&mut table).await.unwrap();
    table.select_tasks(&[2, 3]);
    let rows = table.rows();

    assert!(s.begin_drag(&table, rows[1]));
    let report = s.drop_on(&mut table, DropTarget::Row(rows[3])).await.unwrap();

    assert_eq!(report.moved, vec![2]);
    assert!(report.failures.is_empty());
    assert_eq!(backend.parents_of(2), vec![4]);
    assert_eq!(backend.parents_of(3), vec![2]);
    assert_eq!(backend.count(Method::Put, "/api/v1/tasks/3"), 0);
    assert_eq!(backend.count(Method::Delete, "/api/v1/tasks/3"), 0);
    assert_eq!(table.order(), vec![1, 4, 2, 3]);
    assert_eq!(table.depth_of(3), Some(2));
}
