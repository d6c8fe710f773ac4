//! REST API route definitions.

use axum::{
    routing::{get, post},
    Router,
};

use crate::web::handlers::{replay, scenarios, search};
use crate::web::state::WebAppState;

/// Build the API router with all REST endpoints.
pub fn api_routes() -> Router<WebAppState> {
    Router::new()
        // Search routes
        .route("/search", post(search::fetch_hits))
        // Scenario routes
        .route("/scenarios", get(scenarios::list_scenarios))
        .route("/scenarios", post(scenarios::capture_scenario))
        .route("/scenarios/{name}", get(scenarios::get_scenario))
        // Replay routes
        .route("/replay", post(replay::start_replay))
        .route("/replay/{id}", get(replay::get_replay))
        .route("/replay/{id}/progress", get(replay::replay_progress))
        .route("/replay/{id}/cancel", post(replay::cancel_replay))
}
