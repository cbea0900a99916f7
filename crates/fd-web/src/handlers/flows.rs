//! Flows Handlers
//!
//! Maps HTTP verbs on `/api/flows` onto the flow store.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use fd_core::{FlowCandidate, FlowRecord};
use fd_http::ServiceRouter;
use fd_store::StoreError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

const FETCH_FAILED: &str = "Failed to fetch flows";
const SAVE_FAILED: &str = "Failed to save flow";
const DELETE_FAILED: &str = "Failed to delete flow";
const NOT_FOUND: &str = "Flow not found";

/// The flows resource as a mountable service
pub struct FlowsService;

impl ServiceRouter for FlowsService {
    fn prefix() -> &'static str {
        "/api/flows"
    }

    fn name() -> &'static str {
        "flows"
    }

    fn description() -> &'static str {
        "in-memory flow documents (list / upsert / delete)"
    }
}

impl FlowsService {
    pub fn router(state: Arc<AppState>) -> Router {
        Router::new()
            .route(
                "/",
                get(list_flows_handler)
                    .post(save_flow_handler)
                    .delete(delete_flow_handler),
            )
            .route("/:id", get(get_flow_handler))
            .with_state(state)
    }
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct FlowListResponse {
    pub success: bool,
    pub flows: Vec<FlowRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlowResponse {
    pub success: bool,
    pub flow: FlowRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteFlowParams {
    pub id: Option<String>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// GET /api/flows - List all flows
pub async fn list_flows_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FlowListResponse>, ApiError> {
    let flows = state
        .store
        .list()
        .await
        .map_err(|e| ApiError::internal(FETCH_FAILED, e))?;

    Ok(Json(FlowListResponse {
        success: true,
        flows,
    }))
}

/// GET /api/flows/:id - Fetch a single flow
pub async fn get_flow_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FlowResponse>, ApiError> {
    let flow = state
        .store
        .get(&id)
        .await
        .map_err(|e| ApiError::internal(FETCH_FAILED, e))?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    Ok(Json(FlowResponse {
        success: true,
        flow,
        message: None,
    }))
}

/// POST /api/flows - Create or replace a flow
///
/// The body is parsed by hand so malformed payloads surface as the same
/// generic 500 as store faults.
pub async fn save_flow_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<FlowResponse>, ApiError> {
    let candidate: FlowCandidate =
        serde_json::from_slice(&body).map_err(|e| ApiError::internal(SAVE_FAILED, e))?;

    let flow = match state.store.upsert(candidate).await {
        Ok(flow) => flow,
        Err(StoreError::Conflict { id }) => {
            info!(id = %id, "Flow save rejected: stale updatedAt");
            return Err(ApiError::conflict("Flow was modified concurrently"));
        }
        Err(e) => return Err(ApiError::internal(SAVE_FAILED, e)),
    };

    info!(id = %flow.id, name = %flow.name, "Flow saved");
    Ok(Json(FlowResponse {
        success: true,
        flow,
        message: Some("Flow saved successfully".to_string()),
    }))
}

/// DELETE /api/flows?id=<id> - Delete a flow
pub async fn delete_flow_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeleteFlowParams>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Flow ID is required"))?;

    let removed = state
        .store
        .remove(&id)
        .await
        .map_err(|e| ApiError::internal(DELETE_FAILED, e))?;

    if !removed {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    info!(id = %id, "Flow deleted");
    Ok(Json(MessageResponse {
        success: true,
        message: "Flow deleted successfully".to_string(),
    }))
}
