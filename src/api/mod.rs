mod handlers;
pub mod middleware;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::engine::SprintEngine;
use middleware::{auth_middleware, SecurityConfig};

pub fn create_router(engine: SprintEngine, security: SecurityConfig) -> Router {
    let api = Router::new()
        // Board state
        .route(
            "/boards/{board_id}/counters",
            get(handlers::get_counters).put(handlers::update_counters),
        )
        .route("/boards/{board_id}/badge", get(handlers::get_badge))
        .route("/boards/{board_id}/summary", get(handlers::get_summary))
        .route("/boards/{board_id}/points", post(handlers::add_points))
        .route("/boards/{board_id}/sprint/advance", post(handlers::advance_sprint))
        // Card actions
        .route(
            "/boards/{board_id}/cards/{card_id}/transitions/{transition}",
            post(handlers::run_transition),
        )
        .route(
            "/boards/{board_id}/cards/{card_id}/badges",
            get(handlers::get_card_badges),
        )
        .route(
            "/boards/{board_id}/cards/{card_id}/branch",
            post(handlers::claim_branch),
        )
        .route(
            "/boards/{board_id}/cards/{card_id}/estimate",
            post(handlers::add_card_estimate),
        )
        .route_layer(from_fn_with_state(security.clone(), auth_middleware))
        // Health stays reachable without a key
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&security))
        .with_state(engine)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    match &security.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
        }
        None => CorsLayer::permissive(),
    }
}
