//! Step lists for card actions.
//!
//! Every card action is an ordered list of [`Step`]s. A step is either
//! fatal (its failure ends the action with an error) or advisory (its failure
//! becomes a warning and the list continues). Nothing already written is
//! undone when a fatal step fails.

use crate::config::Field;
use crate::models::Transition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatality {
    Fatal,
    Advisory,
}

/// Workflow list a card can be moved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    InProgress,
    Review,
    /// Ready list on the Dev Done board.
    DoneReady,
    /// Awaiting Epic Completion list on the Dev Done board.
    DoneDeferred,
}

/// What to write into a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    /// Current time, RFC 3339 in UTC.
    Now,
    BranchId,
    SprintNumber,
    /// No value. Clears the field whatever its kind.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Read the sprint counters and derive the branch id.
    LoadCounters,
    /// Add the acting member to the card unless already present.
    JoinCard,
    /// Move to the top of a list, skipped when the card is already there.
    MoveTo(Destination),
    SetField(Field, FieldValue),
    /// Credit a positive estimate to the sprint points.
    CreditEstimate,
    /// Attach a `Branch: <id>` link to the card.
    AttachBranch,
    CopyBranch,
    /// Increment and persist the branch counter.
    ClaimBranch,
}

impl Step {
    pub fn fatality(&self) -> Fatality {
        match self {
            Self::MoveTo(_) | Self::ClaimBranch => Fatality::Fatal,
            _ => Fatality::Advisory,
        }
    }
}

/// Steps for a card transition. Advancing the sprint has no card steps.
pub fn plan(transition: Transition) -> Vec<Step> {
    match transition {
        Transition::Start => vec![
            Step::LoadCounters,
            Step::JoinCard,
            Step::MoveTo(Destination::InProgress),
            Step::SetField(Field::StartDate, FieldValue::Now),
            Step::SetField(Field::Branch, FieldValue::BranchId),
            Step::SetField(Field::Sprint, FieldValue::SprintNumber),
            Step::ClaimBranch,
            Step::CopyBranch,
        ],
        Transition::Review => vec![
            Step::MoveTo(Destination::Review),
            Step::SetField(Field::Blocker, FieldValue::Empty),
        ],
        Transition::Done => finish_plan(Destination::DoneReady),
        Transition::Defer => finish_plan(Destination::DoneDeferred),
        Transition::AdvanceSprint => Vec::new(),
    }
}

/// Points are credited before the move so a failed move leaves them counted.
fn finish_plan(destination: Destination) -> Vec<Step> {
    vec![
        Step::LoadCounters,
        Step::CreditEstimate,
        Step::SetField(Field::EndDate, FieldValue::Now),
        Step::SetField(Field::Sprint, FieldValue::SprintNumber),
        Step::MoveTo(destination),
    ]
}

/// Steps for handing out a branch id without moving the card.
pub fn branch_claim_plan() -> Vec<Step> {
    vec![
        Step::LoadCounters,
        Step::AttachBranch,
        Step::CopyBranch,
        Step::ClaimBranch,
    ]
}
