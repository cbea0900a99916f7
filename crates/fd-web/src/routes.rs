//! Router configuration for fd-web

use axum::{routing::get, Router};
use fd_http::RouterBuilder;
use std::sync::Arc;

use crate::handlers::{self, flows::FlowsService};
use crate::state::AppState;

/// Create the application router (without the shared middleware stack)
pub fn create_router(state: Arc<AppState>, static_dir: Option<String>) -> Router {
    let health = Router::new()
        .route("/api/health", get(handlers::health::health_handler))
        .with_state(state.clone());

    let mut builder = RouterBuilder::new()
        .mount::<FlowsService>(FlowsService::router(state))
        .merge(health);

    if let Some(dir) = static_dir {
        builder = builder.static_dir(dir);
    }

    builder.build()
}
