use serde::{Deserialize, Serialize};

/// Sprint number a workspace starts at before any counters are stored.
pub const DEFAULT_SPRINT_NUMBER: i64 = 1;
/// Branch number every sprint starts counting from.
pub const DEFAULT_BRANCH_NUMBER: i64 = 100;
/// Points a fresh sprint starts with.
pub const DEFAULT_POINTS_DONE: f64 = 0.0;
/// Largest sprint or branch number a board may hold.
pub const MAX_COUNTER: i64 = 1_000_000_000;

/// The three sprint counters kept per board.
///
/// Counters are created implicitly: reading a board that has never stored
/// anything yields [`WorkspaceCounters::default`]. They are never deleted,
/// only reset when the sprint advances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceCounters {
    pub sprint_number: i64,
    /// Next number handed out by a branch claim within the current sprint.
    pub next_branch_number: i64,
    /// Sum of estimates credited during the current sprint.
    pub points_done: f64,
}

impl Default for WorkspaceCounters {
    fn default() -> Self {
        Self {
            sprint_number: DEFAULT_SPRINT_NUMBER,
            next_branch_number: DEFAULT_BRANCH_NUMBER,
            points_done: DEFAULT_POINTS_DONE,
        }
    }
}

impl WorkspaceCounters {
    pub fn new(sprint_number: i64, next_branch_number: i64, points_done: f64) -> Self {
        Self {
            sprint_number,
            next_branch_number,
            points_done,
        }
    }

    /// Branch identifier for the next claim, formatted `{sprint}-{branch}`.
    pub fn branch_id(&self) -> String {
        format!("{}-{}", self.sprint_number, self.next_branch_number)
    }

    /// Counters after a branch number has been handed out. `None` once the
    /// branch number would pass [`MAX_COUNTER`].
    pub fn with_branch_claimed(self) -> Option<Self> {
        let next_branch_number = increment(self.next_branch_number)?;
        Some(Self {
            next_branch_number,
            ..self
        })
    }

    /// Counters after `amount` points have been credited.
    pub fn with_points_added(self, amount: f64) -> Self {
        Self {
            points_done: self.points_done + amount,
            ..self
        }
    }

    /// Counters for the following sprint: sprint incremented, branch and
    /// points reset to their defaults. `None` once the sprint number would
    /// pass [`MAX_COUNTER`].
    pub fn advanced(self) -> Option<Self> {
        Some(Self {
            sprint_number: increment(self.sprint_number)?,
            next_branch_number: DEFAULT_BRANCH_NUMBER,
            points_done: DEFAULT_POINTS_DONE,
        })
    }

    /// Apply a partial settings update. Fields left as `None` keep their value.
    pub fn with_update(self, update: &UpdateCountersInput) -> Self {
        Self {
            sprint_number: update.sprint_number.unwrap_or(self.sprint_number),
            next_branch_number: update.next_branch_number.unwrap_or(self.next_branch_number),
            points_done: update.points_done.unwrap_or(self.points_done),
        }
    }

    /// Check the value ranges a board is allowed to hold.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_COUNTER).contains(&self.sprint_number) {
            return Err(format!("Sprint number must be between 1 and {}", MAX_COUNTER));
        }
        if !(1..=MAX_COUNTER).contains(&self.next_branch_number) {
            return Err(format!("Branch number must be between 1 and {}", MAX_COUNTER));
        }
        if !self.points_done.is_finite() || self.points_done < 0.0 {
            return Err("Points done must be a non-negative number".to_string());
        }
        Ok(())
    }
}

fn increment(value: i64) -> Option<i64> {
    value.checked_add(1).filter(|next| *next <= MAX_COUNTER)
}

/// Input for the settings page. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCountersInput {
    pub sprint_number: Option<i64>,
    pub next_branch_number: Option<i64>,
    pub points_done: Option<f64>,
}

/// Badge shown on the board header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardBadge {
    pub title: String,
    pub text: String,
    pub color: String,
    /// How often the host should re-request the badge.
    pub refresh_seconds: u32,
}

impl BoardBadge {
    pub fn for_counters(counters: &WorkspaceCounters) -> Self {
        Self {
            title: "Sprint Tracker".to_string(),
            text: format!(
                "Sprint #{} • Pts {}",
                counters.sprint_number, counters.points_done
            ),
            color: "blue".to_string(),
            refresh_seconds: 10,
        }
    }
}

/// A story-point badge on a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardBadge {
    /// Only detail-view badges carry a title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
    pub color: String,
}

/// Badges for the card front and the card detail view. Both are empty when
/// the card has no estimate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardBadges {
    pub front: Vec<CardBadge>,
    pub detail: Vec<CardBadge>,
}

impl CardBadges {
    pub fn for_estimate(estimate: Option<f64>) -> Self {
        let Some(points) = estimate else {
            return Self::default();
        };
        Self {
            front: vec![CardBadge {
                title: None,
                text: format!("{} pts", points),
                color: "blue".to_string(),
            }],
            detail: vec![CardBadge {
                title: Some("Story Points".to_string()),
                text: format!("{} points", points),
                color: "blue".to_string(),
            }],
        }
    }
}

/// Snapshot of the current sprint for the summary action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintSummary {
    pub sprint_number: i64,
    pub points_done: f64,
    pub next_branch_id: String,
    pub note: String,
}

impl SprintSummary {
    pub fn for_counters(counters: &WorkspaceCounters, done_workspace: &str) -> Self {
        Self {
            sprint_number: counters.sprint_number,
            points_done: counters.points_done,
            next_branch_id: counters.branch_id(),
            note: format!(
                "Check the {} board for completed cards with Sprint {}",
                done_workspace, counters.sprint_number
            ),
        }
    }
}
