//! Locating workflow lists and boards by name.

use crate::board::BoardApi;
use crate::models::{Collection, Workspace};

/// Case-insensitive substring test used for list and board names.
pub fn name_matches(name: &str, pattern: &str) -> bool {
    name.to_lowercase().contains(&pattern.to_lowercase())
}

/// First list on the board whose name contains `pattern`.
pub async fn find_collection(
    board: &dyn BoardApi,
    workspace_id: &str,
    pattern: &str,
) -> Option<Collection> {
    match board.collections(workspace_id).await {
        Ok(collections) => collections
            .into_iter()
            .find(|c| name_matches(&c.name, pattern)),
        Err(e) => {
            tracing::warn!("Failed to list board {}: {}", workspace_id, e);
            None
        }
    }
}

/// First board visible to the acting member whose name contains `pattern`.
pub async fn find_external_workspace(board: &dyn BoardApi, pattern: &str) -> Option<Workspace> {
    match board.workspaces().await {
        Ok(workspaces) => workspaces
            .into_iter()
            .find(|w| name_matches(&w.name, pattern)),
        Err(e) => {
            tracing::warn!("Failed to list boards: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{FailPoint, MemoryBoard};

    #[test]
    fn matching_ignores_case() {
        assert!(name_matches("🚧 In Progress", "in progress"));
        assert!(name_matches("Awaiting Epic Completion", "awaiting epic completion"));
        assert!(!name_matches("Progressing", "in progress"));
    }

    #[tokio::test]
    async fn first_match_in_listing_order_wins() {
        let board = MemoryBoard::new();
        board.add_collection("b1", "l1", "Backlog");
        board.add_collection("b1", "l2", "In Progress (FE)");
        board.add_collection("b1", "l3", "In Progress (BE)");

        let found = find_collection(&board, "b1", "in progress").await.unwrap();
        assert_eq!(found.id, "l2");
        assert!(find_collection(&board, "b1", "code review").await.is_none());
    }

    #[tokio::test]
    async fn external_board_lookup() {
        let board = MemoryBoard::new();
        board.add_workspace("b1", "Team Sprint");
        board.add_workspace("b2", "Dev Done 2026");

        let found = find_external_workspace(&board, "dev done").await.unwrap();
        assert_eq!(found.id, "b2");

        board.fail(FailPoint::Workspaces);
        assert!(find_external_workspace(&board, "dev done").await.is_none());
    }
}
