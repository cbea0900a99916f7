//! fd-web: flowdeck Web Server
//!
//! Serves the flows resource backing the visual flow builder, plus a health
//! probe and the compiled frontend.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   flowdeck-server (:8080)                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  GET    /api/health        - Health check                       │
//! │  GET    /api/flows         - List flows                         │
//! │  POST   /api/flows         - Create or replace a flow           │
//! │  DELETE /api/flows?id=..   - Delete a flow                      │
//! │  GET    /api/flows/:id     - Fetch one flow                     │
//! │  /                         - Static files (frontend build)      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
