//! Scenario capture and listing handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scenario::{materialize, Scenario, ScenarioInfo, ScenarioStore};
use crate::web::error::WebError;
use crate::web::state::WebAppState;

use super::search::SearchRequest;

#[derive(Debug, Serialize)]
pub struct ListScenariosResponse {
    pub scenarios: Vec<ScenarioInfo>,
}

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub name: String,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(flatten)]
    pub search: SearchRequest,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub name: String,
    pub records: usize,
    pub skipped: usize,
    /// Capture time of the first record; absent when nothing was kept.
    pub origin: Option<i64>,
}

pub async fn list_scenarios(
    State(state): State<WebAppState>,
) -> Result<Json<ListScenariosResponse>, WebError> {
    let scenarios = state.with_store(|store| store.list()).await?;
    Ok(Json(ListScenariosResponse { scenarios }))
}

/// The stored artifact, as written.
pub async fn get_scenario(
    State(state): State<WebAppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, WebError> {
    let scenario: Scenario = state.with_store(move |store| store.load(&name)).await?;
    Ok(Json(scenario.into()))
}

/// Search, sanitize, materialize and store under `name`.
pub async fn capture_scenario(
    State(state): State<WebAppState>,
    Json(req): Json<CaptureRequest>,
) -> Result<(StatusCode, Json<CaptureResponse>), WebError> {
    let name = ScenarioStore::normalize_name(&req.name)?;
    if !req.overwrite {
        let existing = name.clone();
        if state.with_store(move |store| store.exists(&existing)).await? {
            return Err(WebError::Conflict(format!("scenario `{name}` already exists")));
        }
    }

    let hits = req.search.fetch_sanitized(&state).await?;
    let scenario = materialize(hits);
    let response = CaptureResponse {
        name,
        records: scenario.len(),
        skipped: scenario.skipped(),
        origin: scenario.origin_ms(),
    };

    let target = response.name.clone();
    let overwrite = req.overwrite;
    state
        .with_store(move |store| store.save(&target, &scenario, overwrite))
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}
