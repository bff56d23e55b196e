use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sprint_tracker::board::{
    Clipboard, FailPoint, HostError, MemoryBoard, NoClipboard, PresetAnswer, Prompter, Scope,
    Severity,
};
use sprint_tracker::config::WorkflowNames;
use sprint_tracker::engine::counters::{BRANCH_KEY, POINTS_KEY, SPRINT_KEY};
use sprint_tracker::engine::SettingsError;
use sprint_tracker::models::*;
use sprint_tracker::SprintEngine;

// ============================================================
// Fixtures
// ============================================================

/// A team board with every list and field the workflow uses, plus the
/// Dev Done board cards finish on.
fn team_board() -> MemoryBoard {
    let board = MemoryBoard::new();
    board.set_member("m1", "dev");

    board.add_workspace("b1", "Team Sprint");
    board.add_collection("b1", "backlog", "Backlog");
    board.add_collection("b1", "doing", "In Progress");
    board.add_collection("b1", "review", "Code Review");

    board.add_workspace("b2", "Dev Done");
    board.add_collection("b2", "ready", "Ready");
    board.add_collection("b2", "epic", "Awaiting Epic Completion");

    board.define_attribute("b1", "start", "Start Date", AttributeKind::Date);
    board.define_attribute("b1", "end", "End Date", AttributeKind::Date);
    board.define_attribute("b1", "branch", "Branch", AttributeKind::Text);
    board.define_attribute("b1", "sprint", "Sprint", AttributeKind::Number);
    board.define_attribute("b1", "blocker", "Blocker", AttributeKind::Text);
    board.define_attribute("b1", "estimate", "Estimate", AttributeKind::Number);

    board.add_card("b1", "backlog", "c1", "Login page");
    board
}

fn engine_for(board: &MemoryBoard) -> SprintEngine {
    let shared = Arc::new(board.clone());
    SprintEngine::new(shared.clone(), shared, Arc::new(NoClipboard))
}

fn estimate(points: &str) -> AttributePayload {
    AttributePayload {
        number: Some(points.to_string()),
        ..Default::default()
    }
}

async fn seed_counters(engine: &SprintEngine, sprint: i64, branch: i64, points: f64) {
    let input = UpdateCountersInput {
        sprint_number: Some(sprint),
        next_branch_number: Some(branch),
        points_done: Some(points),
    };
    engine
        .update_counters("b1", &input)
        .await
        .expect("Failed to seed counters");
}

#[derive(Clone, Default)]
struct RecordingClipboard {
    copied: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Clipboard for RecordingClipboard {
    async fn copy(&self, text: &str) -> Result<(), HostError> {
        self.copied.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Records what the engine asks. When `board` is set, each confirmation also
/// snapshots the stored sprint number at the moment the question is asked.
#[derive(Default)]
struct RecordingPrompter {
    answer: bool,
    board: Option<MemoryBoard>,
    confirms: Mutex<Vec<(String, Option<Value>)>>,
    popups: Mutex<Vec<(String, String, Value)>>,
}

impl RecordingPrompter {
    fn answering(answer: bool, board: &MemoryBoard) -> Self {
        Self {
            answer,
            board: Some(board.clone()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Prompter for RecordingPrompter {
    async fn alert(&self, _message: &str, _severity: Severity, _duration: Duration) {}

    async fn confirm(&self, message: &str) -> bool {
        let stored = self
            .board
            .as_ref()
            .and_then(|board| board.plugin_value("b1", Scope::Shared, SPRINT_KEY));
        self.confirms
            .lock()
            .unwrap()
            .push((message.to_string(), stored));
        self.answer
    }

    async fn popup(&self, title: &str, url: &str, args: &Value) {
        self.popups
            .lock()
            .unwrap()
            .push((title.to_string(), url.to_string(), args.clone()));
    }
}

// ============================================================
// Board state
// ============================================================

mod board_state {
    use super::*;

    #[tokio::test]
    async fn fresh_board_reads_defaults() {
        let board = team_board();
        let engine = engine_for(&board);

        assert_eq!(engine.counters("b1").await, WorkspaceCounters::new(1, 100, 0.0));
        assert_eq!(engine.badge("b1").await.text, "Sprint #1 • Pts 0");
    }

    #[tokio::test]
    async fn missing_keys_default_individually() {
        let board = team_board();
        board.put_plugin_value("b1", Scope::Shared, SPRINT_KEY, serde_json::json!(7));
        let engine = engine_for(&board);

        assert_eq!(engine.counters("b1").await, WorkspaceCounters::new(7, 100, 0.0));
    }

    #[tokio::test]
    async fn unreadable_storage_falls_back_to_defaults() {
        let board = team_board();
        board.put_plugin_value("b1", Scope::Shared, SPRINT_KEY, serde_json::json!(4));
        board.fail(FailPoint::StorageRead);

        let engine = engine_for(&board);
        assert_eq!(engine.counters("b1").await, WorkspaceCounters::default());
    }

    #[tokio::test]
    async fn private_scope_keeps_its_own_counters() {
        let board = team_board();
        let shared = engine_for(&board);
        let private = engine_for(&board).with_scope(Scope::Private);

        seed_counters(&private, 3, 110, 2.0).await;

        assert_eq!(shared.counters("b1").await, WorkspaceCounters::default());
        assert_eq!(private.counters("b1").await, WorkspaceCounters::new(3, 110, 2.0));
        assert_eq!(
            board.plugin_value("b1", Scope::Private, BRANCH_KEY),
            Some(serde_json::json!(110))
        );
    }

    #[tokio::test]
    async fn summary_points_at_the_done_board() {
        let board = team_board();
        let engine = engine_for(&board);
        seed_counters(&engine, 5, 103, 8.0).await;

        let summary = engine.summary("b1").await;
        assert_eq!(summary.next_branch_id, "5-103");
        assert_eq!(summary.points_done, 8.0);
        assert_eq!(summary.note, "Check the dev done board for completed cards with Sprint 5");
    }

    #[tokio::test]
    async fn settings_popup_receives_current_counters() {
        let board = team_board();
        let engine = engine_for(&board);
        seed_counters(&engine, 2, 104, 1.5).await;

        let prompter = RecordingPrompter::default();
        engine.open_settings("b1", &prompter).await;

        let popups = prompter.popups.lock().unwrap();
        assert_eq!(popups.len(), 1);
        assert_eq!(popups[0].0, "Sprint Settings");
        assert_eq!(popups[0].2["sprint_number"], 2);
        assert_eq!(popups[0].2["next_branch_number"], 104);
    }
}

// ============================================================
// Sprint lifecycle
// ============================================================

mod sprint_lifecycle {
    use super::*;

    #[tokio::test]
    async fn start_done_and_advance_walk_the_counters() {
        let board = team_board();
        let engine = engine_for(&board);
        seed_counters(&engine, 5, 100, 0.0).await;

        let started = engine.start("b1", "c1").await;
        assert!(started.succeeded, "{}", started.message);
        assert_eq!(started.branch_id.as_deref(), Some("5-100"));
        assert_eq!(started.message, "Branch 5-100 started in 'In Progress'");
        assert_eq!(engine.counters("b1").await, WorkspaceCounters::new(5, 101, 0.0));

        let card = board.card_snapshot("c1").unwrap();
        assert_eq!(card.collection_id, "doing");
        assert!(card.has_member("m1"));
        assert_eq!(
            board.attribute_payload("c1", "branch").unwrap().text.as_deref(),
            Some("5-100")
        );
        assert_eq!(
            board.attribute_payload("c1", "sprint").unwrap().number.as_deref(),
            Some("5")
        );
        assert!(board.attribute_payload("c1", "start").unwrap().date.is_some());

        board.put_attribute("c1", "estimate", estimate("3"));
        board.put_attribute("c1", "sprint", AttributePayload::default());
        let done = engine.done("b1", "c1").await;
        assert!(done.succeeded, "{}", done.message);
        assert_eq!(done.points_added, 3.0);
        assert_eq!(done.message, "Moved to 'Ready' on 'Dev Done' (Sprint 5); added 3 points");
        assert_eq!(engine.counters("b1").await, WorkspaceCounters::new(5, 101, 3.0));

        let card = board.card_snapshot("c1").unwrap();
        assert_eq!(card.workspace_id, "b2");
        assert_eq!(card.collection_id, "ready");
        assert!(board.attribute_payload("c1", "end").unwrap().date.is_some());
        assert_eq!(
            board.attribute_payload("c1", "sprint").unwrap().number.as_deref(),
            Some("5")
        );

        let advanced = engine.advance_sprint("b1", &PresetAnswer(true)).await;
        assert!(advanced.succeeded);
        assert_eq!(
            advanced.message,
            "Started Sprint #6! Branch counter reset to 100, points reset to 0."
        );
        assert_eq!(engine.counters("b1").await, WorkspaceCounters::new(6, 100, 0.0));
    }

    #[tokio::test]
    async fn start_without_a_clipboard_warns() {
        let board = team_board();
        let outcome = engine_for(&board).start("b1", "c1").await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("clipboard"));
    }

    #[tokio::test]
    async fn start_copies_branch_when_clipboard_is_available() {
        let board = team_board();
        let clipboard = RecordingClipboard::default();
        let shared = Arc::new(board.clone());
        let engine = SprintEngine::new(shared.clone(), shared, Arc::new(clipboard.clone()));

        let outcome = engine.start("b1", "c1").await;
        assert_eq!(outcome.message, "Branch 1-100 started in 'In Progress' and copied to clipboard");
        assert!(outcome.warnings.is_empty());
        assert_eq!(*clipboard.copied.lock().unwrap(), vec!["1-100".to_string()]);
    }

    #[tokio::test]
    async fn start_fails_without_in_progress_list() {
        let board = MemoryBoard::new();
        board.set_member("m1", "dev");
        board.add_workspace("b1", "Team Sprint");
        board.add_collection("b1", "backlog", "Backlog");
        board.add_card("b1", "backlog", "c1", "Login page");
        let engine = engine_for(&board);

        let outcome = engine.start("b1", "c1").await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.message, "Start failed: could not find list 'in progress'");
        assert_eq!(engine.counters("b1").await, WorkspaceCounters::default());
        // Joining happened before the move and is not undone
        assert!(board.card_snapshot("c1").unwrap().has_member("m1"));
    }

    #[tokio::test]
    async fn start_with_missing_fields_warns_but_claims_branch() {
        let board = MemoryBoard::new();
        board.set_member("m1", "dev");
        board.add_workspace("b1", "Team Sprint");
        board.add_collection("b1", "doing", "In Progress");
        board.add_card("b1", "doing", "c1", "Login page");
        let engine = engine_for(&board);

        let outcome = engine.start("b1", "c1").await;
        assert!(outcome.succeeded);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w == "no 'Branch' field on this board"));
        assert_eq!(engine.counters("b1").await, WorkspaceCounters::new(1, 101, 0.0));
        assert!(board.moves().is_empty());
    }

    #[tokio::test]
    async fn review_clears_the_blocker() {
        let board = team_board();
        board.put_attribute(
            "c1",
            "blocker",
            AttributePayload {
                text: Some("waiting on design".to_string()),
                ..Default::default()
            },
        );

        let outcome = engine_for(&board).review("b1", "c1").await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.message, "Moved to 'Code Review' for review");
        assert_eq!(board.card_snapshot("c1").unwrap().collection_id, "review");
        assert_eq!(board.attribute_payload("c1", "blocker"), None);
    }

    #[tokio::test]
    async fn review_clears_a_checkbox_blocker() {
        let board = MemoryBoard::new();
        board.add_workspace("b1", "Team Sprint");
        board.add_collection("b1", "review", "Code Review");
        board.define_attribute("b1", "blocked", "blocker", AttributeKind::Boolean);
        board.add_card("b1", "review", "c1", "Login page");
        board.put_attribute(
            "c1",
            "blocked",
            AttributePayload {
                checked: Some("true".to_string()),
                ..Default::default()
            },
        );

        let outcome = engine_for(&board).review("b1", "c1").await;
        assert!(outcome.succeeded, "{}", outcome.message);
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(board.attribute_payload("c1", "blocked"), None);
    }

    #[tokio::test]
    async fn review_warns_when_the_blocker_cannot_be_cleared() {
        let board = team_board();
        board.fail(FailPoint::AttributeWrite);

        let outcome = engine_for(&board).review("b1", "c1").await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(board.card_snapshot("c1").unwrap().collection_id, "review");
    }

    #[tokio::test]
    async fn done_with_zero_estimate_moves_without_points() {
        let board = team_board();
        board.put_attribute("c1", "estimate", estimate("0"));
        let engine = engine_for(&board);

        let outcome = engine.done("b1", "c1").await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.points_added, 0.0);
        assert_eq!(outcome.message, "Moved to 'Ready' on 'Dev Done' (Sprint 1)");
        assert_eq!(engine.counters("b1").await.points_done, 0.0);
    }

    #[tokio::test]
    async fn done_without_estimate_moves_without_points() {
        let board = team_board();
        let outcome = engine_for(&board).done("b1", "c1").await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.points_added, 0.0);
        assert_eq!(board.card_snapshot("c1").unwrap().collection_id, "ready");
    }

    #[tokio::test]
    async fn text_estimate_is_not_credited() {
        let board = MemoryBoard::new();
        board.add_workspace("b1", "Team Sprint");
        board.add_workspace("b2", "Dev Done");
        board.add_collection("b2", "ready", "Ready");
        board.define_attribute("b1", "estimate", "estimate", AttributeKind::Text);
        board.add_card("b1", "backlog", "c1", "Login page");
        board.put_attribute(
            "c1",
            "estimate",
            AttributePayload {
                text: Some("3".to_string()),
                ..Default::default()
            },
        );
        let engine = engine_for(&board);

        let outcome = engine.done("b1", "c1").await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.points_added, 0.0);
        assert_eq!(engine.counters("b1").await.points_done, 0.0);
    }

    #[tokio::test]
    async fn defer_lands_in_awaiting_epic_completion() {
        let board = team_board();
        board.put_attribute("c1", "estimate", estimate("2"));
        let engine = engine_for(&board);

        let outcome = engine.defer("b1", "c1").await;
        assert!(outcome.succeeded);
        assert_eq!(
            outcome.message,
            "Moved to 'Awaiting Epic Completion' on 'Dev Done' (Sprint 1); added 2 points"
        );
        let card = board.card_snapshot("c1").unwrap();
        assert_eq!(card.workspace_id, "b2");
        assert_eq!(card.collection_id, "epic");
        assert_eq!(engine.counters("b1").await.points_done, 2.0);
    }

    #[tokio::test]
    async fn done_move_passes_the_target_board() {
        let board = team_board();
        engine_for(&board).done("b1", "c1").await;

        let moves = board.moves();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].1.workspace_id.as_deref(), Some("b2"));
        assert_eq!(moves[0].1.collection_id, "ready");
    }

    #[tokio::test]
    async fn done_without_done_board_keeps_credited_points() {
        let board = MemoryBoard::new();
        board.add_workspace("b1", "Team Sprint");
        board.define_attribute("b1", "estimate", "Estimate", AttributeKind::Number);
        board.add_card("b1", "backlog", "c1", "Login page");
        board.put_attribute("c1", "estimate", estimate("3"));
        let engine = engine_for(&board);

        let outcome = engine.done("b1", "c1").await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.message, "Done failed: could not find board 'dev done'");
        assert_eq!(outcome.points_added, 3.0);
        assert_eq!(engine.counters("b1").await.points_done, 3.0);
    }

    #[tokio::test]
    async fn done_board_name_is_configurable() {
        let board = team_board();
        board.add_workspace("b3", "Shipped");
        board.add_collection("b3", "s-ready", "Ready");
        let names = WorkflowNames {
            done_board: "shipped".to_string(),
            ..WorkflowNames::default()
        };
        let engine = engine_for(&board).with_names(names);

        let outcome = engine.done("b1", "c1").await;
        assert!(outcome.succeeded);
        assert_eq!(board.card_snapshot("c1").unwrap().workspace_id, "b3");
    }

    #[tokio::test]
    async fn advance_asks_before_writing() {
        let board = team_board();
        let engine = engine_for(&board);
        seed_counters(&engine, 5, 104, 6.0).await;

        let prompter = RecordingPrompter::answering(true, &board);
        let outcome = engine.advance_sprint("b1", &prompter).await;
        assert!(outcome.succeeded, "{}", outcome.message);

        let confirms = prompter.confirms.lock().unwrap();
        assert_eq!(confirms.len(), 1);
        let (question, stored_sprint) = &confirms[0];
        assert!(question.contains("Start Sprint 6?"), "{}", question);
        assert!(question.contains("Increment sprint to 6"));
        assert!(question.contains("Reset branch counter to 100"));
        assert!(question.contains("Reset points to 0"));
        assert_eq!(stored_sprint, &Some(serde_json::json!(5)));

        assert_eq!(engine.counters("b1").await, WorkspaceCounters::new(6, 100, 0.0));
    }

    #[tokio::test]
    async fn declined_advance_changes_nothing() {
        let board = team_board();
        let engine = engine_for(&board);
        seed_counters(&engine, 5, 104, 6.0).await;

        let prompter = RecordingPrompter::answering(false, &board);
        let outcome = engine.advance_sprint("b1", &prompter).await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.message, "Sprint advance cancelled");
        assert!(prompter.confirms.lock().unwrap()[0].0.contains("Start Sprint 6?"));
        assert_eq!(engine.counters("b1").await, WorkspaceCounters::new(5, 104, 6.0));
    }

    #[tokio::test]
    async fn advance_stops_at_the_sprint_limit() {
        let board = team_board();
        let engine = engine_for(&board);
        seed_counters(&engine, MAX_COUNTER, 104, 6.0).await;

        let prompter = RecordingPrompter::answering(true, &board);
        let outcome = engine.advance_sprint("b1", &prompter).await;
        assert!(!outcome.succeeded);
        assert_eq!(
            outcome.message,
            "Advance Sprint failed: sprint number is at its limit (1000000000)"
        );
        assert!(prompter.confirms.lock().unwrap().is_empty());
        assert_eq!(
            engine.counters("b1").await,
            WorkspaceCounters::new(MAX_COUNTER, 104, 6.0)
        );
    }

    #[tokio::test]
    async fn start_fails_when_the_branch_counter_is_at_its_limit() {
        let board = team_board();
        let engine = engine_for(&board);
        seed_counters(&engine, 5, MAX_COUNTER, 0.0).await;

        let outcome = engine.start("b1", "c1").await;
        assert!(!outcome.succeeded);
        assert_eq!(
            outcome.message,
            "Start failed: branch number is at its limit (1000000000)"
        );
        assert_eq!(
            engine.counters("b1").await,
            WorkspaceCounters::new(5, MAX_COUNTER, 0.0)
        );
    }

    #[tokio::test]
    async fn advance_reports_storage_failure() {
        let board = team_board();
        board.fail(FailPoint::StorageWrite);

        let outcome = engine_for(&board)
            .transition("b1", None, Transition::AdvanceSprint, &PresetAnswer(true))
            .await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.message, "Advance Sprint failed: could not save counters");
    }
}

// ============================================================
// Card actions
// ============================================================

mod card_actions {
    use super::*;

    #[tokio::test]
    async fn claim_branch_attaches_and_increments() {
        let board = team_board();
        let engine = engine_for(&board);

        let outcome = engine.claim_branch("b1", "c1").await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.message, "Branch 1-100 created and attached to card!");
        assert_eq!(engine.counters("b1").await.next_branch_number, 101);

        let attachments = board.attachments("c1");
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "Branch: 1-100");
        assert_eq!(attachments[0].url, "#branch-1-100");
        // The card does not move
        assert!(board.moves().is_empty());
    }

    #[tokio::test]
    async fn claim_branch_prefers_the_clipboard_message() {
        let board = team_board();
        let shared = Arc::new(board.clone());
        let engine = SprintEngine::new(
            shared.clone(),
            shared,
            Arc::new(RecordingClipboard::default()),
        );

        let outcome = engine.claim_branch("b1", "c1").await;
        assert_eq!(outcome.message, "Branch 1-100 created and copied to clipboard!");
    }

    #[tokio::test]
    async fn claim_branch_still_counts_when_attach_and_copy_fail() {
        let board = team_board();
        board.fail(FailPoint::Attach);
        let engine = engine_for(&board);

        let outcome = engine.claim_branch("b1", "c1").await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.message, "Branch 1-100 created");
        assert_eq!(outcome.warnings.len(), 2);
        assert_eq!(engine.counters("b1").await.next_branch_number, 101);
    }

    #[tokio::test]
    async fn consecutive_claims_hand_out_distinct_ids() {
        let board = team_board();
        board.add_card("b1", "backlog", "c2", "Signup page");
        let engine = engine_for(&board);

        let first = engine.claim_branch("b1", "c1").await;
        let second = engine.claim_branch("b1", "c2").await;
        assert_eq!(first.branch_id.as_deref(), Some("1-100"));
        assert_eq!(second.branch_id.as_deref(), Some("1-101"));
    }

    #[tokio::test]
    async fn claim_branch_fails_at_the_limit() {
        let board = team_board();
        let engine = engine_for(&board);
        seed_counters(&engine, 2, MAX_COUNTER, 0.0).await;

        let outcome = engine.claim_branch("b1", "c1").await;
        assert!(!outcome.succeeded);
        assert_eq!(
            outcome.message,
            "Claim Branch failed: branch number is at its limit (1000000000)"
        );
        assert_eq!(engine.counters("b1").await.next_branch_number, MAX_COUNTER);
    }

    #[tokio::test]
    async fn oversized_settings_are_rejected() {
        let board = team_board();
        let engine = engine_for(&board);

        for input in [
            UpdateCountersInput {
                next_branch_number: Some(i64::MAX),
                ..Default::default()
            },
            UpdateCountersInput {
                sprint_number: Some(i64::MAX),
                ..Default::default()
            },
        ] {
            let result = engine.update_counters("b1", &input).await;
            assert!(matches!(result, Err(SettingsError::Invalid(_))));
        }
        assert!(board.plugin_value("b1", Scope::Shared, BRANCH_KEY).is_none());
        assert!(board.plugin_value("b1", Scope::Shared, SPRINT_KEY).is_none());
    }

    #[tokio::test]
    async fn card_badges_show_the_estimate() {
        let board = team_board();
        board.put_attribute("c1", "estimate", estimate("3"));
        let engine = engine_for(&board);

        let badges = engine.card_badges("c1").await;
        assert_eq!(badges.front.len(), 1);
        assert_eq!(badges.front[0].text, "3 pts");
        assert_eq!(badges.detail[0].title.as_deref(), Some("Story Points"));
        assert_eq!(badges.detail[0].text, "3 points");
    }

    #[tokio::test]
    async fn card_badges_are_empty_without_an_estimate() {
        let board = team_board();
        let engine = engine_for(&board);

        assert_eq!(engine.card_badges("c1").await, CardBadges::default());
        assert_eq!(engine.card_badges("missing").await, CardBadges::default());
    }

    #[tokio::test]
    async fn card_estimate_is_credited() {
        let board = team_board();
        board.put_attribute("c1", "estimate", estimate("2.5"));
        let engine = engine_for(&board);

        let outcome = engine.add_card_estimate("b1", "c1").await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.message, "Added 2.5 points to sprint total (now 2.5 points)");
        assert_eq!(engine.counters("b1").await.points_done, 2.5);
    }

    #[tokio::test]
    async fn card_estimate_requires_a_value() {
        let board = team_board();
        let outcome = engine_for(&board).add_card_estimate("b1", "c1").await;

        assert!(!outcome.succeeded);
        assert_eq!(
            outcome.message,
            "No estimate found. Please add an \"estimate\" custom field with a number value."
        );
    }

    #[tokio::test]
    async fn card_estimate_must_be_positive() {
        let board = team_board();
        board.put_attribute("c1", "estimate", estimate("0"));
        let engine = engine_for(&board);

        let outcome = engine.add_card_estimate("b1", "c1").await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.message, "Estimate must be greater than 0.");
        assert_eq!(engine.counters("b1").await.points_done, 0.0);
    }

    #[tokio::test]
    async fn adding_points_rejects_non_positive_amounts() {
        let board = team_board();
        let engine = engine_for(&board);

        let outcome = engine.add_points("b1", -1.0).await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.message, "Points to add must be greater than 0 (got -1)");
        assert!(board.plugin_value("b1", Scope::Shared, POINTS_KEY).is_none());
    }

    #[tokio::test]
    async fn adding_points_accumulates() {
        let board = team_board();
        let engine = engine_for(&board);

        engine.add_points("b1", 2.0).await;
        let outcome = engine.add_points("b1", 3.5).await;
        assert_eq!(outcome.message, "Added 3.5 points to sprint total (now 5.5 points)");
        assert_eq!(outcome.points_added, 3.5);
    }
}
