//! Board state and card workflow automation.
//!
//! [`SprintEngine`] holds the host collaborators and runs every user action
//! against an explicit board (and card) id. Each public operation reports a
//! [`TransitionOutcome`]; host errors are logged and folded into it, never
//! returned.

pub mod accrual;
pub mod attributes;
pub mod collections;
pub mod counters;
pub mod steps;

use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;

use crate::board::{BoardApi, Clipboard, PluginStorage, Prompter, Scope};
use crate::config::{Field, WorkflowNames};
use crate::models::*;

use counters::CounterStore;
use steps::{Destination, Fatality, FieldValue, Step};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0}")]
    Invalid(String),

    #[error("Failed to save sprint counters")]
    Storage,
}

/// Mutable state threaded through one run of a step list.
struct RunState {
    card: Card,
    counters: Option<WorkspaceCounters>,
    branch_id: Option<String>,
    /// Where the card ended up, with the external board when it left.
    destination: Option<(Collection, Option<Workspace>)>,
    points_added: f64,
    attached: bool,
    copied: bool,
    warnings: Vec<String>,
}

impl RunState {
    fn new(card: Card) -> Self {
        Self {
            card,
            counters: None,
            branch_id: None,
            destination: None,
            points_added: 0.0,
            attached: false,
            copied: false,
            warnings: Vec::new(),
        }
    }

    fn destination_name(&self) -> String {
        self.destination
            .as_ref()
            .map(|(collection, _)| collection.name.clone())
            .unwrap_or_default()
    }
}

enum Target<'a> {
    Local(&'a str),
    External { board: &'a str, list: &'a str },
}

#[derive(Clone)]
pub struct SprintEngine {
    board: Arc<dyn BoardApi>,
    storage: Arc<dyn PluginStorage>,
    clipboard: Arc<dyn Clipboard>,
    names: WorkflowNames,
    scope: Scope,
}

impl SprintEngine {
    pub fn new(
        board: Arc<dyn BoardApi>,
        storage: Arc<dyn PluginStorage>,
        clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        Self {
            board,
            storage,
            clipboard,
            names: WorkflowNames::default(),
            scope: Scope::Shared,
        }
    }

    pub fn with_names(mut self, names: WorkflowNames) -> Self {
        self.names = names;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    fn store(&self) -> CounterStore<'_> {
        CounterStore::new(self.storage.as_ref(), self.scope)
    }

    // ============================================================
    // Board state
    // ============================================================

    pub async fn counters(&self, workspace_id: &str) -> WorkspaceCounters {
        self.store().read(workspace_id).await
    }

    pub async fn badge(&self, workspace_id: &str) -> BoardBadge {
        BoardBadge::for_counters(&self.counters(workspace_id).await)
    }

    pub async fn summary(&self, workspace_id: &str) -> SprintSummary {
        SprintSummary::for_counters(&self.counters(workspace_id).await, &self.names.done_board)
    }

    /// Estimate badges for a card. A card that cannot be loaded gets none.
    pub async fn card_badges(&self, card_id: &str) -> CardBadges {
        let card = match self.board.card(card_id).await {
            Ok(card) => card,
            Err(e) => {
                tracing::warn!("Failed to load card {} for badges: {}", card_id, e);
                return CardBadges::default();
            }
        };
        let field = self.names.field(Field::Estimate);
        let estimate = attributes::read_estimate(self.board.as_ref(), &card, field).await;
        CardBadges::for_estimate(estimate)
    }

    /// Overwrite counters from the settings page.
    pub async fn update_counters(
        &self,
        workspace_id: &str,
        input: &UpdateCountersInput,
    ) -> Result<WorkspaceCounters, SettingsError> {
        let store = self.store();
        let counters = store.read(workspace_id).await.with_update(input);
        counters.validate().map_err(SettingsError::Invalid)?;
        if !store.write(workspace_id, &counters).await {
            return Err(SettingsError::Storage);
        }
        Ok(counters)
    }

    /// Show the settings popup with the current counters.
    pub async fn open_settings(&self, workspace_id: &str, prompter: &dyn Prompter) {
        let counters = self.counters(workspace_id).await;
        prompter
            .popup("Sprint Settings", "./sprint-settings.html", &json!(counters))
            .await;
    }

    // ============================================================
    // Transitions
    // ============================================================

    /// Run any transition. Card transitions need `card_id`; advancing the
    /// sprint asks `prompter` for confirmation.
    pub async fn transition(
        &self,
        workspace_id: &str,
        card_id: Option<&str>,
        transition: Transition,
        prompter: &dyn Prompter,
    ) -> TransitionOutcome {
        match (transition, card_id) {
            (Transition::AdvanceSprint, _) => self.advance_sprint(workspace_id, prompter).await,
            (_, None) => TransitionOutcome::failure(format!("{} needs a card", transition)),
            (Transition::Start, Some(card_id)) => self.start(workspace_id, card_id).await,
            (Transition::Review, Some(card_id)) => self.review(workspace_id, card_id).await,
            (Transition::Done, Some(card_id)) => self.done(workspace_id, card_id).await,
            (Transition::Defer, Some(card_id)) => self.defer(workspace_id, card_id).await,
        }
    }

    /// Join the card, move it to In Progress and hand out the next branch id.
    pub async fn start(&self, workspace_id: &str, card_id: &str) -> TransitionOutcome {
        let label = Transition::Start.label();
        let state = match self
            .run(workspace_id, card_id, label, &steps::plan(Transition::Start))
            .await
        {
            Ok(state) => state,
            Err(outcome) => return outcome,
        };

        let branch_id = state.branch_id.clone().unwrap_or_default();
        let mut message = format!("Branch {} started in '{}'", branch_id, state.destination_name());
        if state.copied {
            message.push_str(" and copied to clipboard");
        }
        TransitionOutcome::success(message)
            .with_branch(branch_id)
            .with_warnings(state.warnings)
    }

    /// Move the card to Code Review and clear its blocker.
    pub async fn review(&self, workspace_id: &str, card_id: &str) -> TransitionOutcome {
        let label = Transition::Review.label();
        match self.run(workspace_id, card_id, label, &steps::plan(Transition::Review)).await {
            Ok(state) => TransitionOutcome::success(format!(
                "Moved to '{}' for review",
                state.destination_name()
            ))
            .with_warnings(state.warnings),
            Err(outcome) => outcome,
        }
    }

    /// Credit the estimate, stamp the end date and move the card to the
    /// Ready list on the Dev Done board.
    pub async fn done(&self, workspace_id: &str, card_id: &str) -> TransitionOutcome {
        self.finish(workspace_id, card_id, Transition::Done).await
    }

    /// Like [`done`](Self::done), but lands in Awaiting Epic Completion.
    pub async fn defer(&self, workspace_id: &str, card_id: &str) -> TransitionOutcome {
        self.finish(workspace_id, card_id, Transition::Defer).await
    }

    async fn finish(
        &self,
        workspace_id: &str,
        card_id: &str,
        transition: Transition,
    ) -> TransitionOutcome {
        let state = match self
            .run(workspace_id, card_id, transition.label(), &steps::plan(transition))
            .await
        {
            Ok(state) => state,
            Err(outcome) => return outcome,
        };

        let board_name = state
            .destination
            .as_ref()
            .and_then(|(_, workspace)| workspace.as_ref())
            .map(|w| w.name.clone())
            .unwrap_or_default();
        let sprint = state
            .counters
            .map(|c| c.sprint_number)
            .unwrap_or_default();
        let mut message = format!(
            "Moved to '{}' on '{}' (Sprint {})",
            state.destination_name(),
            board_name,
            sprint
        );
        if state.points_added > 0.0 {
            message.push_str(&format!("; added {} points", state.points_added));
        }
        TransitionOutcome::success(message)
            .with_points(state.points_added)
            .with_warnings(state.warnings)
    }

    /// Start the next sprint after the user confirms. Branch and points
    /// reset; nothing is written when the user declines.
    pub async fn advance_sprint(
        &self,
        workspace_id: &str,
        prompter: &dyn Prompter,
    ) -> TransitionOutcome {
        let store = self.store();
        let Some(next) = store.read(workspace_id).await.advanced() else {
            tracing::error!("Sprint number on board {} is at its limit", workspace_id);
            return TransitionOutcome::failure(format!(
                "{} failed: sprint number is at its limit ({})",
                Transition::AdvanceSprint,
                MAX_COUNTER
            ));
        };

        let question = format!(
            "Start Sprint {}?\n\nThis will:\n• Increment sprint to {}\n• Reset branch counter to {}\n• Reset points to 0",
            next.sprint_number, next.sprint_number, next.next_branch_number
        );
        if !prompter.confirm(&question).await {
            tracing::info!("Sprint advance on board {} cancelled", workspace_id);
            return TransitionOutcome::failure("Sprint advance cancelled");
        }

        if !store.write(workspace_id, &next).await {
            return TransitionOutcome::failure(format!(
                "{} failed: could not save counters",
                Transition::AdvanceSprint
            ));
        }

        TransitionOutcome::success(format!(
            "Started Sprint #{}! Branch counter reset to {}, points reset to 0.",
            next.sprint_number, next.next_branch_number
        ))
    }

    // ============================================================
    // Card actions
    // ============================================================

    /// Hand out the next branch id without moving the card: attach it as a
    /// link, copy it, and bump the counter.
    pub async fn claim_branch(&self, workspace_id: &str, card_id: &str) -> TransitionOutcome {
        let state = match self
            .run(workspace_id, card_id, "Claim Branch", &steps::branch_claim_plan())
            .await
        {
            Ok(state) => state,
            Err(outcome) => return outcome,
        };

        let branch_id = state.branch_id.clone().unwrap_or_default();
        let message = if state.copied {
            format!("Branch {} created and copied to clipboard!", branch_id)
        } else if state.attached {
            format!("Branch {} created and attached to card!", branch_id)
        } else {
            format!("Branch {} created", branch_id)
        };
        TransitionOutcome::success(message)
            .with_branch(branch_id)
            .with_warnings(state.warnings)
    }

    /// Credit the card's estimate to the sprint points.
    pub async fn add_card_estimate(&self, workspace_id: &str, card_id: &str) -> TransitionOutcome {
        let card = match self.board.card(card_id).await {
            Ok(card) => card,
            Err(e) => {
                tracing::error!("Failed to load card {}: {}", card_id, e);
                return TransitionOutcome::failure(format!("Could not load card {}", card_id));
            }
        };

        let field = self.names.field(Field::Estimate);
        match attributes::read_estimate(self.board.as_ref(), &card, field).await {
            None => TransitionOutcome::failure(format!(
                "No estimate found. Please add an \"{}\" custom field with a number value.",
                field
            )),
            Some(estimate) if estimate <= 0.0 => {
                TransitionOutcome::failure("Estimate must be greater than 0.")
            }
            Some(estimate) => accrual::apply(&self.store(), workspace_id, estimate).await,
        }
    }

    /// Credit an amount the caller already read. Crediting the same card
    /// twice counts it twice.
    pub async fn add_points(&self, workspace_id: &str, amount: f64) -> TransitionOutcome {
        accrual::apply(&self.store(), workspace_id, amount).await
    }

    // ============================================================
    // Step runner
    // ============================================================

    async fn run(
        &self,
        workspace_id: &str,
        card_id: &str,
        action: &str,
        steps: &[Step],
    ) -> Result<RunState, TransitionOutcome> {
        let card = match self.board.card(card_id).await {
            Ok(card) => card,
            Err(e) => {
                tracing::error!("{} failed: could not load card {}: {}", action, card_id, e);
                return Err(TransitionOutcome::failure(format!(
                    "{} failed: could not load card {}",
                    action, card_id
                )));
            }
        };

        let mut state = RunState::new(card);
        for step in steps {
            let Err(reason) = self.execute(*step, workspace_id, &mut state).await else {
                continue;
            };
            match step.fatality() {
                Fatality::Fatal => {
                    tracing::error!("{} failed on card {}: {}", action, card_id, reason);
                    return Err(TransitionOutcome::failure(format!("{} failed: {}", action, reason))
                        .with_points(state.points_added)
                        .with_warnings(state.warnings));
                }
                Fatality::Advisory => {
                    tracing::warn!("{} on card {}: {}", action, card_id, reason);
                    state.warnings.push(reason);
                }
            }
        }
        tracing::info!("{} completed on card {}", action, card_id);
        Ok(state)
    }

    async fn execute(
        &self,
        step: Step,
        workspace_id: &str,
        state: &mut RunState,
    ) -> Result<(), String> {
        match step {
            Step::LoadCounters => {
                self.load_counters(workspace_id, state).await;
                Ok(())
            }
            Step::JoinCard => self.join_card(state).await,
            Step::MoveTo(destination) => self.move_card(workspace_id, destination, state).await,
            Step::SetField(field, value) => self.set_field(workspace_id, field, value, state).await,
            Step::CreditEstimate => self.credit_estimate(workspace_id, state).await,
            Step::AttachBranch => {
                let branch_id = self.branch_id(workspace_id, state).await;
                let attachment = Attachment {
                    name: format!("Branch: {}", branch_id),
                    url: format!("#branch-{}", branch_id),
                };
                self.board
                    .attach(&state.card.id, &attachment)
                    .await
                    .map_err(|e| format!("could not attach branch to card: {}", e))?;
                state.attached = true;
                Ok(())
            }
            Step::CopyBranch => {
                let branch_id = self.branch_id(workspace_id, state).await;
                self.clipboard
                    .copy(&branch_id)
                    .await
                    .map_err(|e| format!("could not copy branch to clipboard: {}", e))?;
                state.copied = true;
                Ok(())
            }
            Step::ClaimBranch => {
                let next = self
                    .load_counters(workspace_id, state)
                    .await
                    .with_branch_claimed()
                    .ok_or_else(|| format!("branch number is at its limit ({})", MAX_COUNTER))?;
                if !self.store().write(workspace_id, &next).await {
                    return Err("could not save the branch counter".to_string());
                }
                state.counters = Some(next);
                Ok(())
            }
        }
    }

    /// Counters as of the first read in this run. The branch id is fixed at
    /// that point so later increments do not change it.
    async fn load_counters(&self, workspace_id: &str, state: &mut RunState) -> WorkspaceCounters {
        if let Some(counters) = state.counters {
            return counters;
        }
        let counters = self.store().read(workspace_id).await;
        state.branch_id = Some(counters.branch_id());
        state.counters = Some(counters);
        counters
    }

    async fn branch_id(&self, workspace_id: &str, state: &mut RunState) -> String {
        self.load_counters(workspace_id, state).await;
        state.branch_id.clone().unwrap_or_default()
    }

    async fn join_card(&self, state: &mut RunState) -> Result<(), String> {
        let member = self
            .board
            .current_member()
            .await
            .map_err(|e| format!("could not identify the current member: {}", e))?;
        if state.card.has_member(&member.id) {
            return Ok(());
        }
        self.board
            .add_member(&state.card.id, &member.id)
            .await
            .map_err(|e| format!("could not join card: {}", e))?;
        state.card.member_ids.push(member.id);
        Ok(())
    }

    fn target(&self, destination: Destination) -> Target<'_> {
        match destination {
            Destination::InProgress => Target::Local(&self.names.in_progress_list),
            Destination::Review => Target::Local(&self.names.review_list),
            Destination::DoneReady => Target::External {
                board: &self.names.done_board,
                list: &self.names.done_list,
            },
            Destination::DoneDeferred => Target::External {
                board: &self.names.done_board,
                list: &self.names.deferred_list,
            },
        }
    }

    async fn locate(
        &self,
        workspace_id: &str,
        destination: Destination,
    ) -> Result<(Collection, Option<Workspace>), String> {
        let board = self.board.as_ref();
        match self.target(destination) {
            Target::Local(list) => collections::find_collection(board, workspace_id, list)
                .await
                .map(|collection| (collection, None))
                .ok_or_else(|| format!("could not find list '{}'", list)),
            Target::External { board: name, list } => {
                let workspace = collections::find_external_workspace(board, name)
                    .await
                    .ok_or_else(|| format!("could not find board '{}'", name))?;
                let collection = collections::find_collection(board, &workspace.id, list)
                    .await
                    .ok_or_else(|| {
                        format!("could not find list '{}' on board '{}'", list, workspace.name)
                    })?;
                Ok((collection, Some(workspace)))
            }
        }
    }

    async fn move_card(
        &self,
        workspace_id: &str,
        destination: Destination,
        state: &mut RunState,
    ) -> Result<(), String> {
        let (collection, workspace) = self.locate(workspace_id, destination).await?;
        let target_workspace = workspace.as_ref().map(|w| w.id.clone());

        let same_board = target_workspace
            .as_deref()
            .map_or(true, |id| id == state.card.workspace_id);
        if same_board && state.card.collection_id == collection.id {
            tracing::debug!("Card {} already in '{}'", state.card.id, collection.name);
        } else {
            let target = CardMove {
                collection_id: collection.id.clone(),
                workspace_id: target_workspace.clone(),
            };
            self.board
                .move_card(&state.card.id, &target)
                .await
                .map_err(|e| format!("could not move card to '{}': {}", collection.name, e))?;
            tracing::info!("Moved card {} to '{}'", state.card.id, collection.name);
            state.card.collection_id = collection.id.clone();
            if let Some(id) = target_workspace {
                state.card.workspace_id = id;
            }
        }

        state.destination = Some((collection, workspace));
        Ok(())
    }

    async fn set_field(
        &self,
        workspace_id: &str,
        field: Field,
        value: FieldValue,
        state: &mut RunState,
    ) -> Result<(), String> {
        let board = self.board.as_ref();
        let name = self.names.field(field);
        let definition = attributes::resolve_definition(board, workspace_id, name)
            .await
            .ok_or_else(|| format!("no '{}' field on this board", name))?;

        let written = match value {
            FieldValue::Empty => attributes::clear_value(board, &state.card.id, &definition).await,
            FieldValue::Now => {
                let now = Value::String(chrono::Utc::now().to_rfc3339());
                attributes::write_value(board, &state.card.id, &definition, &now).await
            }
            FieldValue::BranchId => {
                let branch_id = Value::String(self.branch_id(workspace_id, state).await);
                attributes::write_value(board, &state.card.id, &definition, &branch_id).await
            }
            FieldValue::SprintNumber => {
                let sprint = self.load_counters(workspace_id, state).await.sprint_number;
                attributes::write_value(board, &state.card.id, &definition, &json!(sprint)).await
            }
        };

        if written {
            Ok(())
        } else {
            Err(format!("could not set '{}'", name))
        }
    }

    async fn credit_estimate(
        &self,
        workspace_id: &str,
        state: &mut RunState,
    ) -> Result<(), String> {
        let field = self.names.field(Field::Estimate);
        let estimate = attributes::read_estimate(self.board.as_ref(), &state.card, field).await;
        let amount = match estimate {
            Some(amount) if amount > 0.0 => amount,
            _ => {
                tracing::debug!("Card {} has no usable estimate", state.card.id);
                return Ok(());
            }
        };

        let outcome = accrual::apply(&self.store(), workspace_id, amount).await;
        if !outcome.succeeded {
            return Err(format!("could not credit {} points", amount));
        }
        state.points_added = amount;
        if let Some(counters) = state.counters.as_mut() {
            counters.points_done += amount;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{FailPoint, MemoryBoard, NoClipboard, PresetAnswer};

    fn engine(board: &MemoryBoard) -> SprintEngine {
        let board = Arc::new(board.clone());
        SprintEngine::new(board.clone(), board, Arc::new(NoClipboard))
    }

    fn sprint_board() -> MemoryBoard {
        let board = MemoryBoard::new();
        board.set_member("m1", "dev");
        board.add_workspace("b1", "Team Sprint");
        board.add_collection("b1", "backlog", "Backlog");
        board.add_collection("b1", "doing", "In Progress");
        board.define_attribute("b1", "branch", "Branch", AttributeKind::Text);
        board.add_card("b1", "backlog", "c1", "Login page");
        board
    }

    #[tokio::test]
    async fn fatal_step_keeps_earlier_warnings() {
        let board = sprint_board();
        board.fail(FailPoint::AddMember);
        board.fail(FailPoint::Move);

        let outcome = engine(&board).start("b1", "c1").await;
        assert!(!outcome.succeeded);
        assert!(outcome.message.starts_with("Start failed: could not move card to 'In Progress'"));
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("could not join card"));
    }

    #[tokio::test]
    async fn missing_card_fails_before_any_step() {
        let board = sprint_board();
        let outcome = engine(&board).review("b1", "nope").await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.message, "Review failed: could not load card nope");
    }

    #[tokio::test]
    async fn card_transition_without_card_is_rejected() {
        let board = sprint_board();
        let outcome = engine(&board)
            .transition("b1", None, Transition::Done, &PresetAnswer(true))
            .await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.message, "Done needs a card");
    }

    #[tokio::test]
    async fn rerunning_start_in_place_skips_the_move() {
        let board = sprint_board();
        let engine = engine(&board);

        assert!(engine.start("b1", "c1").await.succeeded);
        assert!(engine.start("b1", "c1").await.succeeded);

        assert_eq!(board.moves().len(), 1);
        let branch = board.attribute_payload("c1", "branch").unwrap();
        assert_eq!(branch.text.as_deref(), Some("1-101"));
    }

    #[tokio::test]
    async fn settings_update_validates_before_writing() {
        let board = sprint_board();
        let engine = engine(&board);

        let invalid = UpdateCountersInput {
            sprint_number: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            engine.update_counters("b1", &invalid).await,
            Err(SettingsError::Invalid(_))
        ));

        let valid = UpdateCountersInput {
            next_branch_number: Some(120),
            ..Default::default()
        };
        let counters = engine.update_counters("b1", &valid).await.unwrap();
        assert_eq!(counters, WorkspaceCounters::new(1, 120, 0.0));

        board.fail(FailPoint::StorageWrite);
        assert!(matches!(
            engine.update_counters("b1", &valid).await,
            Err(SettingsError::Storage)
        ));
    }
}
