use crate::constants::{NAME, VERSION};
use crate::models::HealthResponse;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use std::sync::Arc;

pub async fn landing() -> String {
    format!("{NAME} v{VERSION} is running")
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        uptime: state.started.elapsed().as_millis() as u64,
        available_jobs: state.jobs.available_permits(),
    })
}
