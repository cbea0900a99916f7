//! fd-http: Shared HTTP Server Plumbing
//!
//! Every flowdeck HTTP surface is composed and served through this crate.
//!
//! ```text
//! flowdeck-server binary
//!     └── fd-http (this crate)
//!         ├── Middleware stack (CORS, tracing, compression, timeout, headers)
//!         ├── Router composition
//!         │   ├── /api/flows/*  → fd_web flows service
//!         │   ├── /api/health   → fd_web health
//!         │   └── /*            → static files (frontend build)
//!         └── Graceful shutdown on Ctrl+C / SIGTERM
//! ```

pub mod middleware;
pub mod router;
pub mod server;

pub use middleware::{apply_middleware, MiddlewareConfig};
pub use router::{RouterBuilder, ServiceRouter};
pub use server::{shutdown_signal, HttpServer, HttpServerBuilder, ServerConfig};

// Re-export axum for convenience
pub use axum;
pub use tower_http;

/// Error types for the HTTP server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Server binding error: {0}")]
    BindError(#[from] std::io::Error),

    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
