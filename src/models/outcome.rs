use serde::{Deserialize, Serialize};

/// A lifecycle operation a user can trigger on a card or board.
///
/// The workflow list a card sits in is its state; transitions are not
/// guarded by where the card currently is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Backlog → In Progress, claiming a branch id.
    Start,
    /// → Code Review.
    Review,
    /// → Ready on the Dev Done board, crediting the estimate.
    Done,
    /// → Awaiting Epic Completion on the Dev Done board, crediting the estimate.
    Defer,
    /// Board-level: next sprint, branch and points reset.
    AdvanceSprint,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Review => "review",
            Self::Done => "done",
            Self::Defer => "defer",
            Self::AdvanceSprint => "advance_sprint",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "start" => Some(Self::Start),
            "review" => Some(Self::Review),
            "done" => Some(Self::Done),
            "defer" => Some(Self::Defer),
            "advance_sprint" => Some(Self::AdvanceSprint),
            _ => None,
        }
    }

    /// Name used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Review => "Review",
            Self::Done => "Done",
            Self::Defer => "Defer",
            Self::AdvanceSprint => "Advance Sprint",
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The aggregate result of one user action.
///
/// Never persisted. A failed outcome does not imply nothing was written:
/// counter and attribute writes committed before the failing step stay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub succeeded: bool,
    pub message: String,
    pub points_added: f64,
    /// Advisory steps that failed without stopping the action.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Branch id handed out by the action, if any.
    #[serde(default)]
    pub branch_id: Option<String>,
}

impl TransitionOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
            points_added: 0.0,
            warnings: Vec::new(),
            branch_id: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            ..Self::success(message)
        }
    }

    pub fn with_points(mut self, points: f64) -> Self {
        self.points_added = points;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = Some(branch_id.into());
        self
    }
}
