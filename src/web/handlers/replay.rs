//! Replay start, progress, status and cancellation handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::replay::{HttpIngestSink, ReplaySnapshot};
use crate::web::error::WebError;
use crate::web::state::WebAppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartReplayRequest {
    #[serde(alias = "scenario_name")]
    pub scenario_identifier: String,
    #[serde(alias = "hec_url")]
    pub ingestion_endpoint: String,
    #[serde(alias = "hec_token")]
    pub ingestion_token: String,
}

#[derive(Debug, Serialize)]
pub struct StartReplayResponse {
    pub message: &'static str,
    pub replay_id: Uuid,
}

/// Start a replay in the background and acknowledge immediately.
pub async fn start_replay(
    State(state): State<WebAppState>,
    Json(req): Json<StartReplayRequest>,
) -> Result<Json<StartReplayResponse>, WebError> {
    if req.scenario_identifier.trim().is_empty() {
        return Err(WebError::BadRequest("missing scenario identifier".into()));
    }
    let identifier = req.scenario_identifier.clone();
    let path = state
        .with_store(move |store| store.locate(&identifier))
        .await?;
    let sink = HttpIngestSink::new(
        &req.ingestion_endpoint,
        &req.ingestion_token,
        &state.config().ingest,
    )?;

    let replay_id = state
        .replays()
        .start(req.scenario_identifier.trim(), path, Arc::new(sink))?;

    Ok(Json(StartReplayResponse {
        message: "Replay started successfully",
        replay_id,
    }))
}

/// Relay a replay's frames as server-sent events. The stream ends after the
/// summary frame.
pub async fn replay_progress(
    State(state): State<WebAppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, WebError> {
    let rx = state.replays().subscribe(id)?;
    tracing::debug!(%id, "progress observer attached");

    let frames = stream::unfold(rx, |mut rx| async move {
        let frame = rx.recv().await?;
        Some((Event::default().json_data(&frame), rx))
    });

    Ok(Sse::new(frames).keep_alive(KeepAlive::default()))
}

pub async fn get_replay(
    State(state): State<WebAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReplaySnapshot>, WebError> {
    state
        .replays()
        .snapshot(id)
        .map(Json)
        .ok_or_else(|| WebError::NotFound(format!("replay {id}")))
}

pub async fn cancel_replay(
    State(state): State<WebAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReplaySnapshot>, WebError> {
    Ok(Json(state.replays().cancel(id)?))
}
