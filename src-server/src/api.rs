use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use inboxledger_core::import::UserRunSummary;

use crate::config::Config;
use crate::error::ApiResult;
use crate::SharedState;

pub fn app_router(state: SharedState, config: &Config) -> Router {
    Router::new()
        .route("/api/v1/healthz", get(healthz))
        .route("/api/v1/sync/run", post(run_sync))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.request_timeout))
        .with_state(state)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncRunResponse {
    imported: usize,
    skipped: usize,
    users: Vec<UserRunSummary>,
}

/// The parameterless "run sync now" trigger. Returns counts; per-item
/// reasons go to the logs.
async fn run_sync(State(state): State<SharedState>) -> ApiResult<Json<SyncRunResponse>> {
    let summary = state.ctx.import_service.run_sync().await?;
    Ok(Json(SyncRunResponse {
        imported: summary.imported(),
        skipped: summary.skipped(),
        users: summary.users,
    }))
}
