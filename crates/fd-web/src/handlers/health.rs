//! Health Check Handler

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// None when the store could not be queried
    pub flow_count: Option<usize>,
}

/// GET /api/health - Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let flow_count = match state.store.len().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!("Health check could not count flows: {}", e);
            None
        }
    };

    Json(HealthResponse {
        status: if flow_count.is_some() { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        flow_count,
    })
}
