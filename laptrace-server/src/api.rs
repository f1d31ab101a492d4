//! REST API and SSE routes
//!
//! Thin JSON adapter over the engine contract: one POST for push ingest,
//! pure-read GETs for every analytic, and an SSE stream of live updates.
//! Pending analytics serialize as `{"status": "..."}` at this boundary.

use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{Stream, StreamExt as FuturesStreamExt};
use laptrace_core::model::{IngestOutcome, Sample};
use laptrace_core::TelemetryError;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/api/telemetry", post(ingest_sample))
        .route("/api/live/stream", get(live_stream))
        .route("/api/sources", get(list_sources))
        .route("/api/dashboard", get(dashboard))
        .route("/api/optimal-lap", get(optimal_lap))
        .route("/api/racing-line", get(racing_line))
        .route("/api/improvement-zones", get(improvement_zones))
        .route("/api/laps", get(lap_history))
        .route("/api/tire", get(tire_status))
        .route("/api/performance", get(performance))
        .route("/api/corners", get(corner_analysis))
        .route("/api/overtaking", get(overtaking_zones))
        .route("/api/stats", get(session_stats))
        .route("/api/race/total-laps", post(set_total_laps))
        .route("/api/session/save", post(save_session))
        .route("/api/session/load", post(load_session))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn service_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "laptrace-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// === Ingest ===

async fn ingest_sample(
    State(state): State<AppState>,
    Json(sample): Json<Sample>,
) -> Result<Json<IngestOutcome>, (StatusCode, String)> {
    let outcome = {
        let mut engine = state.engine.write().await;
        engine.process_sample(sample)
    };

    match outcome {
        Ok(outcome) => {
            // Mirror every outcome onto the live stream; ignore the error
            // when nobody is subscribed.
            let _ = state.updates_tx.send(outcome.clone());
            Ok(Json(outcome))
        }
        Err(e @ TelemetryError::MalformedSample { .. }) => {
            tracing::warn!("rejected sample: {}", e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

// === Live stream ===

async fn live_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(outcome) => match serde_json::to_string(&outcome) {
                Ok(json) => Some(Ok(Event::default().data(json))),
                Err(e) => {
                    tracing::error!("Failed to serialize update: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Broadcast stream error: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// === Source endpoints ===

#[derive(Serialize)]
struct SourceInfo {
    key: String,
    name: String,
    detected: bool,
    active: bool,
}

async fn list_sources(State(state): State<AppState>) -> Json<Vec<SourceInfo>> {
    let sources = state.sources.read().await;
    let active_key = state.active_source.read().await;

    let info: Vec<SourceInfo> = sources
        .iter()
        .map(|source| SourceInfo {
            key: source.key().to_string(),
            name: source.name().to_string(),
            detected: source.detect(),
            active: source.is_active()
                || active_key
                    .as_ref()
                    .map(|k| k == source.key())
                    .unwrap_or(false),
        })
        .collect();

    Json(info)
}

// === Query endpoints ===

async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    Json(engine.dashboard())
}

async fn optimal_lap(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    Json(engine.optimal_lap())
}

async fn racing_line(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    Json(engine.racing_line())
}

async fn improvement_zones(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    Json(engine.improvement_zones())
}

#[derive(Deserialize)]
struct LapsQuery {
    limit: Option<usize>,
}

async fn lap_history(
    State(state): State<AppState>,
    Query(query): Query<LapsQuery>,
) -> impl IntoResponse {
    let engine = state.engine.read().await;
    Json(engine.lap_history(query.limit.unwrap_or(15)))
}

async fn tire_status(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    Json(engine.tire_status())
}

async fn performance(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    Json(engine.performance())
}

async fn corner_analysis(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    Json(engine.corner_analysis())
}

async fn overtaking_zones(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    Json(engine.overtaking_zones())
}

async fn session_stats(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    Json(engine.session_stats())
}

// === Control endpoints ===

#[derive(Deserialize)]
struct TotalLapsRequest {
    total_laps: u32,
}

async fn set_total_laps(
    State(state): State<AppState>,
    Json(request): Json<TotalLapsRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let mut engine = state.engine.write().await;
    engine
        .set_race_total_laps(request.total_laps)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok(Json(serde_json::json!({
        "total_laps": engine.race_total_laps()
    })))
}

#[derive(Deserialize, Default)]
struct SaveRequest {
    filename: Option<String>,
}

async fn save_session(
    State(state): State<AppState>,
    request: Option<Json<SaveRequest>>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let Json(request) = request.unwrap_or_default();

    let engine = state.engine.read().await;
    let path = engine
        .save_session(request.filename.as_deref())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(serde_json::json!({
        "filename": path.display().to_string()
    })))
}

#[derive(Deserialize)]
struct LoadRequest {
    filename: String,
}

async fn load_session(
    State(state): State<AppState>,
    Json(request): Json<LoadRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let mut engine = state.engine.write().await;
    engine
        .load_session(std::path::Path::new(&request.filename))
        .map_err(|e| match e {
            TelemetryError::SessionIo(_) => (StatusCode::NOT_FOUND, e.to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        })?;

    Ok(Json(serde_json::json!({ "loaded": true })))
}
