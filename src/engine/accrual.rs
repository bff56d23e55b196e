//! Crediting story points to the sprint total.

use super::counters::CounterStore;
use crate::models::TransitionOutcome;

/// Add `amount` to the board's points.
///
/// Amounts that are not positive are rejected without touching storage.
/// This is a plain read-modify-write: nothing stops the same card from
/// being credited twice.
pub async fn apply(store: &CounterStore<'_>, workspace_id: &str, amount: f64) -> TransitionOutcome {
    if !amount.is_finite() || amount <= 0.0 {
        tracing::warn!("Rejected point accrual of {} on board {}", amount, workspace_id);
        return TransitionOutcome::failure(format!(
            "Points to add must be greater than 0 (got {})",
            amount
        ));
    }

    let counters = store.read(workspace_id).await.with_points_added(amount);
    if !store.write(workspace_id, &counters).await {
        return TransitionOutcome::failure("Failed to add points to the sprint total");
    }

    TransitionOutcome::success(format!(
        "Added {} points to sprint total (now {} points)",
        amount, counters.points_done
    ))
    .with_points(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{FailPoint, MemoryBoard, Scope};
    use crate::models::WorkspaceCounters;

    #[tokio::test]
    async fn adds_to_existing_points() {
        let board = MemoryBoard::new();
        let store = CounterStore::new(&board, Scope::Shared);
        store.write("b1", &WorkspaceCounters::new(2, 105, 5.0)).await;

        let outcome = apply(&store, "b1", 3.0).await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.points_added, 3.0);
        assert_eq!(outcome.message, "Added 3 points to sprint total (now 8 points)");
        assert_eq!(store.read("b1").await, WorkspaceCounters::new(2, 105, 8.0));
    }

    #[tokio::test]
    async fn rejects_non_positive_amounts() {
        let board = MemoryBoard::new();
        let store = CounterStore::new(&board, Scope::Shared);

        for amount in [0.0, -2.0, f64::NAN] {
            let outcome = apply(&store, "b1", amount).await;
            assert!(!outcome.succeeded);
            assert_eq!(outcome.points_added, 0.0);
        }
        assert_eq!(store.read("b1").await.points_done, 0.0);
    }

    #[tokio::test]
    async fn write_failure_credits_nothing() {
        let board = MemoryBoard::new();
        board.fail(FailPoint::StorageWrite);
        let store = CounterStore::new(&board, Scope::Shared);

        let outcome = apply(&store, "b1", 2.0).await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.points_added, 0.0);
    }

    #[tokio::test]
    async fn repeated_accrual_double_counts() {
        let board = MemoryBoard::new();
        let store = CounterStore::new(&board, Scope::Shared);

        apply(&store, "b1", 2.0).await;
        apply(&store, "b1", 2.0).await;
        assert_eq!(store.read("b1").await.points_done, 4.0);
    }
}
