use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::board::PresetAnswer;
use crate::engine::{SettingsError, SprintEngine};
use crate::models::*;

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPointsInput {
    pub amount: f64,
}

/// The power-up asks the user before calling; the answer travels in the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceSprintInput {
    #[serde(default)]
    pub confirmed: bool,
}

// ============================================================
// Error Handling
// ============================================================

fn settings_error(e: SettingsError) -> (StatusCode, String) {
    match e {
        SettingsError::Invalid(msg) => {
            tracing::warn!("Validation error: {}", msg);
            (StatusCode::BAD_REQUEST, msg)
        }
        SettingsError::Storage => {
            tracing::error!("Internal error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Board State
// ============================================================

pub async fn get_counters(
    State(engine): State<SprintEngine>,
    Path(board_id): Path<String>,
) -> Json<WorkspaceCounters> {
    Json(engine.counters(&board_id).await)
}

pub async fn update_counters(
    State(engine): State<SprintEngine>,
    Path(board_id): Path<String>,
    Json(input): Json<UpdateCountersInput>,
) -> Result<Json<WorkspaceCounters>, (StatusCode, String)> {
    engine
        .update_counters(&board_id, &input)
        .await
        .map(Json)
        .map_err(settings_error)
}

pub async fn get_badge(
    State(engine): State<SprintEngine>,
    Path(board_id): Path<String>,
) -> Json<BoardBadge> {
    Json(engine.badge(&board_id).await)
}

pub async fn get_summary(
    State(engine): State<SprintEngine>,
    Path(board_id): Path<String>,
) -> Json<SprintSummary> {
    Json(engine.summary(&board_id).await)
}

pub async fn add_points(
    State(engine): State<SprintEngine>,
    Path(board_id): Path<String>,
    Json(input): Json<AddPointsInput>,
) -> Json<TransitionOutcome> {
    Json(engine.add_points(&board_id, input.amount).await)
}

pub async fn advance_sprint(
    State(engine): State<SprintEngine>,
    Path(board_id): Path<String>,
    Json(input): Json<AdvanceSprintInput>,
) -> Json<TransitionOutcome> {
    Json(
        engine
            .advance_sprint(&board_id, &PresetAnswer(input.confirmed))
            .await,
    )
}

// ============================================================
// Card Actions
// ============================================================

pub async fn run_transition(
    State(engine): State<SprintEngine>,
    Path((board_id, card_id, transition)): Path<(String, String, String)>,
) -> Result<Json<TransitionOutcome>, (StatusCode, String)> {
    let transition = match Transition::from_str(&transition) {
        Some(Transition::AdvanceSprint) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "advance_sprint is a board action".to_string(),
            ))
        }
        Some(transition) => transition,
        None => {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Unknown transition: {}", transition),
            ))
        }
    };

    let outcome = engine
        .transition(&board_id, Some(&card_id), transition, &PresetAnswer(false))
        .await;
    Ok(Json(outcome))
}

pub async fn get_card_badges(
    State(engine): State<SprintEngine>,
    Path((_board_id, card_id)): Path<(String, String)>,
) -> Json<CardBadges> {
    Json(engine.card_badges(&card_id).await)
}

pub async fn claim_branch(
    State(engine): State<SprintEngine>,
    Path((board_id, card_id)): Path<(String, String)>,
) -> Json<TransitionOutcome> {
    Json(engine.claim_branch(&board_id, &card_id).await)
}

pub async fn add_card_estimate(
    State(engine): State<SprintEngine>,
    Path((board_id, card_id)): Path<(String, String)>,
) -> Json<TransitionOutcome> {
    Json(engine.add_card_estimate(&board_id, &card_id).await)
}
