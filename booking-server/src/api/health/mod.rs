//! Health check endpoint

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::reservations::storage::StorageStats;
use crate::utils::AppResult;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    /// Server instance epoch; changes on every restart
    epoch: String,
    stats: StorageStats,
}

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

async fn health(State(state): State<ServerState>) -> AppResult<Json<HealthResponse>> {
    let stats = state.manager.stats()?;
    Ok(Json(HealthResponse {
        status: "ok",
        epoch: state.manager.epoch().to_string(),
        stats,
    }))
}
