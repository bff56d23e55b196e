//! Sprint counters in the board's plugin data.

use serde_json::{json, Map, Value};

use crate::board::{PluginStorage, Scope};
use crate::models::{WorkspaceCounters, MAX_COUNTER};

pub const SPRINT_KEY: &str = "sprint_tracker_sprint";
pub const BRANCH_KEY: &str = "sprint_tracker_branch";
pub const POINTS_KEY: &str = "sprint_tracker_points";

/// Reads and writes [`WorkspaceCounters`] through a [`PluginStorage`].
///
/// Neither operation surfaces an error: a failed read yields the defaults,
/// a failed write returns `false`. Both are logged.
///
/// There is no compare-and-set: two actions that read the same counters
/// before either writes can hand out the same branch id.
pub struct CounterStore<'a> {
    storage: &'a dyn PluginStorage,
    scope: Scope,
}

impl<'a> CounterStore<'a> {
    pub fn new(storage: &'a dyn PluginStorage, scope: Scope) -> Self {
        Self { storage, scope }
    }

    /// Current counters. Missing or unusable keys fall back to their own
    /// default, so boards holding only some of the keys still read cleanly.
    pub async fn read(&self, workspace_id: &str) -> WorkspaceCounters {
        match self.try_read(workspace_id).await {
            Ok(counters) => counters,
            Err(e) => {
                tracing::error!(
                    "Failed to read sprint counters for board {}: {}",
                    workspace_id,
                    e
                );
                WorkspaceCounters::default()
            }
        }
    }

    async fn try_read(
        &self,
        workspace_id: &str,
    ) -> Result<WorkspaceCounters, crate::board::HostError> {
        let defaults = WorkspaceCounters::default();
        let sprint = self.storage.get(workspace_id, self.scope, SPRINT_KEY).await?;
        let branch = self.storage.get(workspace_id, self.scope, BRANCH_KEY).await?;
        let points = self.storage.get(workspace_id, self.scope, POINTS_KEY).await?;

        Ok(WorkspaceCounters {
            sprint_number: positive_integer(sprint.as_ref()).unwrap_or(defaults.sprint_number),
            next_branch_number: positive_integer(branch.as_ref())
                .unwrap_or(defaults.next_branch_number),
            points_done: non_negative_number(points.as_ref()).unwrap_or(defaults.points_done),
        })
    }

    /// Persist all three counters in one call.
    pub async fn write(&self, workspace_id: &str, counters: &WorkspaceCounters) -> bool {
        let mut entries = Map::new();
        entries.insert(SPRINT_KEY.to_string(), json!(counters.sprint_number));
        entries.insert(BRANCH_KEY.to_string(), json!(counters.next_branch_number));
        entries.insert(POINTS_KEY.to_string(), json!(counters.points_done));

        match self.storage.set(workspace_id, self.scope, &entries).await {
            Ok(()) => {
                tracing::info!(
                    sprint = counters.sprint_number,
                    branch = counters.next_branch_number,
                    points = counters.points_done,
                    "Saved sprint counters for board {}",
                    workspace_id
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    "Failed to save sprint counters for board {}: {}",
                    workspace_id,
                    e
                );
                false
            }
        }
    }
}

fn as_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn positive_integer(value: Option<&Value>) -> Option<i64> {
    as_number(value)
        .filter(|n| *n >= 1.0 && *n <= MAX_COUNTER as f64 && n.fract() == 0.0)
        .map(|n| n as i64)
}

fn non_negative_number(value: Option<&Value>) -> Option<f64> {
    as_number(value).filter(|n| *n >= 0.0)
}
