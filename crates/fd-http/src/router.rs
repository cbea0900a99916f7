//! Router Composition
//!
//! Services expose their routes through [`ServiceRouter`] and are mounted
//! under their prefix by [`RouterBuilder`].

use axum::Router;
use std::path::PathBuf;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, info, warn};

/// Trait for crates that provide HTTP routes
///
/// ```ignore
/// pub struct FlowsService;
///
/// impl ServiceRouter for FlowsService {
///     fn prefix() -> &'static str {
///         "/api/flows"
///     }
///
///     fn name() -> &'static str {
///         "flows"
///     }
/// }
/// ```
pub trait ServiceRouter: Send + Sync {
    /// The URL prefix for this service (e.g., "/api/flows")
    fn prefix() -> &'static str;

    /// Service name for logging
    fn name() -> &'static str;

    fn description() -> &'static str {
        ""
    }
}

/// Composes service routers and the static frontend into one router
pub struct RouterBuilder {
    router: Router,
    static_dir: Option<PathBuf>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            static_dir: None,
        }
    }

    /// Mount a [`ServiceRouter`] implementation at its own prefix
    pub fn mount<S: ServiceRouter>(mut self, router: Router) -> Self {
        info!("Mounting service '{}' at {}", S::name(), S::prefix());
        if !S::description().is_empty() {
            debug!("{}: {}", S::name(), S::description());
        }
        self.router = self.router.nest(S::prefix(), router);
        self
    }

    /// Merge routes that carry their own full paths
    pub fn merge(mut self, router: Router) -> Self {
        self.router = self.router.merge(router);
        self
    }

    /// Serve the frontend build from `path` for every unmatched route
    pub fn static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(path.into());
        self
    }

    pub fn build(mut self) -> Router {
        if let Some(static_dir) = self.static_dir {
            if static_dir.exists() {
                info!("Serving static files from: {:?}", static_dir);
                // Client-side routes fall back to the SPA entry point
                let index = ServeFile::new(static_dir.join("index.html"));
                self.router = self.router.fallback_service(
                    ServeDir::new(static_dir)
                        .append_index_html_on_directories(true)
                        .not_found_service(index),
                );
            } else {
                warn!("Static directory not found: {:?}", static_dir);
            }
        }

        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
