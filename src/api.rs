use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::model::{ProcessedEntry, RawFeedbackItem};
use crate::pipeline::{IngestReport, InsightPipeline, PipelineStats};

/// Shared state for the transport seam. The pipeline is the only thing
/// handlers need; everything else lives behind it.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: InsightPipeline,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ingest", post(ingest))
        .route("/insights", get(insights))
        .route("/actions", get(actions))
        .route("/debug/pipeline", get(debug_pipeline))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Entry point external collectors invoke to submit new feedback. Identity
/// filtering and queueing happen inside the pipeline; extraction runs
/// fire-and-forget after the response is sent.
async fn ingest(
    State(state): State<AppState>,
    Json(items): Json<Vec<RawFeedbackItem>>,
) -> Json<IngestReport> {
    Json(state.pipeline.ingest(items))
}

/// Current ranked view: severity descending, then younger first.
async fn insights(State(state): State<AppState>) -> Json<Vec<ProcessedEntry>> {
    Json(state.pipeline.query_insights().await)
}

#[derive(Serialize)]
struct ActionsResponse {
    actions: String,
}

async fn actions(State(state): State<AppState>) -> Json<ActionsResponse> {
    Json(ActionsResponse {
        actions: state.pipeline.query_actions().await,
    })
}

async fn debug_pipeline(State(state): State<AppState>) -> Json<PipelineStats> {
    Json(state.pipeline.stats())
}
