//! Row reordering: place every child row directly under its parent's row.

use crate::error::Result;
use crate::hierarchy::HierarchyResolver;
use crate::model::TaskId;
use crate::ports::{RowKey, RowTable};

struct RowPlan {
    row: RowKey,
    depth: usize,
    parent: Option<TaskId>,
}

/// Moves rows so children follow their parents and stamps each row's depth.
#[derive(Clone)]
pub struct RowReorderer {
    resolver: HierarchyResolver,
}

impl RowReorderer {
    /// Creates a reorderer resolving depths through `resolver`.
    #[must_use]
    pub fn new(resolver: HierarchyResolver) -> Self {
        Self { resolver }
    }

    /// Reorders `table` and returns the number of rows moved.
    ///
    /// Rows are placed in ascending depth order so a grandchild is only
    /// positioned after its own parent has found its place. A child whose
    /// parent row is not in the table stays where it is. Rows without a
    /// resolvable task get depth 0. Running this twice on an unchanged graph
    /// moves nothing the second time.
    ///
    /// # Errors
    ///
    /// Returns an error if any fetch fails; the table is left untouched.
    pub async fn reorder(&self, table: &mut dyn RowTable) -> Result<usize> {
        let rows = table.rows();
        let bound: Vec<(RowKey, Option<TaskId>)> =
            rows.iter().map(|&row| (row, table.task_id(row))).collect();

        let ids: Vec<TaskId> = bound.iter().filter_map(|(_, id)| *id).collect();
        self.resolver.fetcher().resolve(&ids).await?;

        let mut plans = Vec::with_capacity(bound.len());
        for &(row, id) in &bound {
            let plan = match id {
                Some(id) => match self.resolver.fetcher().resolve_one(id).await? {
                    Some(task) => {
                        let depth = self.resolver.depth(id).await?;
                        RowPlan { row, depth, parent: task.parent.map(|p| p.id) }
                    }
                    None => RowPlan { row, depth: 0, parent: None },
                },
                None => RowPlan { row, depth: 0, parent: None },
            };
            plans.push(plan);
        }

        let target = plan_order(&rows, &bound, &plans);

        let mut current = rows;
        let mut moves = 0;
        for pair in target.windows(2) {
            let (anchor, row) = (pair[0], pair[1]);
            if place_after(&mut current, row, anchor) {
                table.move_after(row, anchor);
                moves += 1;
            }
        }
        for plan in &plans {
            table.set_depth(plan.row, plan.depth);
        }
        tracing::debug!(rows = plans.len(), moves, "reordered rows");
        Ok(moves)
    }
}

/// Computes the final row order without touching the table.
fn plan_order(rows: &[RowKey], bound: &[(RowKey, Option<TaskId>)], plans: &[RowPlan]) -> Vec<RowKey> {
    let mut order = rows.to_vec();
    // Reverse before the stable sort so siblings inserted one by one right
    // after their parent end up in their original relative order.
    let mut queue: Vec<&RowPlan> = plans.iter().rev().collect();
    queue.sort_by_key(|plan| plan.depth);

    for plan in queue {
        if plan.depth == 0 {
            continue;
        }
        let Some(parent) = plan.parent else { continue };
        let anchor = bound.iter().find(|(_, id)| *id == Some(parent)).map(|(row, _)| *row);
        if let Some(anchor) = anchor {
            place_after(&mut order, plan.row, anchor);
        }
    }
    order
}

/// Moves `row` directly behind `anchor` in `order`; returns whether it moved.
fn place_after(order: &mut Vec<RowKey>, row: RowKey, anchor: RowKey) -> bool {
    if row == anchor {
        return false;
    }
    let (Some(from), Some(to)) =
        (order.iter().position(|&r| r == row), order.iter().position(|&r| r == anchor))
    else {
        return false;
    };
    if from == to + 1 {
        return false;
    }
    order.remove(from);
    let to = if from < to { to - 1 } else { to };
    order.insert(to + 1, row);
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::memory::{Fault, MemoryBackend, MemoryTable};
    use crate::api::TaskApi;
    use crate::fetch::BatchFetcher;
    use crate::ports::Method;
    use crate::store::TaskStore;

    fn reorderer(backend: MemoryBackend) -> RowReorderer {
        let api = TaskApi::new(Arc::new(backend));
        let fetcher = BatchFetcher::new(api, Arc::new(TaskStore::new()));
        RowReorderer::new(HierarchyResolver::new(fetcher))
    }

    #[tokio::test]
    async fn child_moves_under_parent() {
        let r = reorderer(
            MemoryBackend::new().with_task(1, 9, None).with_task(2, 9, Some(1)).with_task(3, 9, None),
        );
        let mut table = MemoryTable::from_task_ids(&[2, 1, 3]);
        r.reorder(&mut table).await.unwrap();
        assert_eq!(table.order(), vec![1, 2, 3]);
        assert_eq!(table.depth_of(1), Some(0));
        assert_eq!(table.depth_of(2), Some(1));
        assert_eq!(table.depth_of(3), Some(0));
    }

    #[tokio::test]
    async fn second_pass_moves_nothing() {
        let r = reorderer(
            MemoryBackend::new()
                .with_task(1, 9, None)
                .with_task(2, 9, Some(1))
                .with_task(3, 9, Some(2))
                .with_task(4, 9, Some(1))
                .with_task(5, 9, None),
        );
        let mut table = MemoryTable::from_task_ids(&[3, 5, 4, 2, 1]);
        let first = r.reorder(&mut table).await.unwrap();
        assert!(first > 0);
        let settled = table.order();
        table.reset_moves();

        assert_eq!(r.reorder(&mut table).await.unwrap(), 0);
        assert_eq!(table.moves(), 0);
        assert_eq!(table.order(), settled);
    }

    #[tokio::test]
    async fn grandchildren_follow_their_parent_regardless_of_input_order() {
        let r = reorderer(
            MemoryBackend::new()
                .with_task(1, 9, None)
                .with_task(2, 9, Some(1))
                .with_task(3, 9, Some(2))
                .with_task(4, 9, Some(1)),
        );
        let mut table = MemoryTable::from_task_ids(&[3, 4, 2, 1]);
        r.reorder(&mut table).await.unwrap();
        // Siblings 4 and 2 keep their relative input order.
        assert_eq!(table.order(), vec![1, 4, 2, 3]);
        assert_eq!(table.depth_of(3), Some(2));
    }

    #[tokio::test]
    async fn child_of_hidden_parent_stays_put() {
        let r = reorderer(
            MemoryBackend::new().with_task(1, 9, None).with_task(2, 9, Some(1)).with_task(3, 9, None),
        );
        let mut table = MemoryTable::from_task_ids(&[3, 2]);
        r.reorder(&mut table).await.unwrap();
        assert_eq!(table.order(), vec![3, 2]);
        assert_eq!(table.depth_of(2), Some(1));
    }

    #[tokio::test]
    async fn unresolvable_and_unbound_rows_get_depth_zero() {
        let r = reorderer(MemoryBackend::new().with_task(1, 9, None));
        let mut table = MemoryTable::new();
        let unbound = table.push(None);
        table.push(Some(77));
        table.push(Some(1));
        r.reorder(&mut table).await.unwrap();
        assert_eq!(table.depth_of(77), Some(0));
        assert_eq!(table.snapshot()[0].key, unbound);
        assert_eq!(table.snapshot()[0].depth, Some(0));
    }

    #[tokio::test]
    async fn fetch_failure_leaves_table_untouched() {
        let r = reorderer(
            MemoryBackend::new()
                .with_task(1, 9, None)
                .with_task(2, 9, Some(1))
                .with_fault(Method::Get, "/api/v1/tasks/all", Fault::Status(500)),
        );
        let mut table = MemoryTable::from_task_ids(&[2, 1]);
        assert!(r.reorder(&mut table).await.is_err());
        assert_eq!(table.order(), vec![2, 1]);
        assert_eq!(table.depth_of(2), None);
    }

    #[test]
    fn place_after_reports_noops() {
        let mut order = vec![1, 2, 3];
        assert!(!place_after(&mut order, 2, 1));
        assert!(place_after(&mut order, 1, 3));
        assert_eq!(order, vec![2, 3, 1]);
    }
}
