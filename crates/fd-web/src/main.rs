//! flowdeck-server: Main Entry Point
//!
//! Serves the flows API, the health probe and (optionally) the compiled
//! frontend from a single process.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fd_core::config::{self, ServerSettings};
use fd_http::HttpServer;
use fd_web::{create_router, AppState};

const DEFAULT_LOG_FILTER: &str = "info,fd_web=debug,fd_http=debug,fd_store=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from /etc/flowdeck/environment (if exists)
    let env_file = config::load_environment();

    init_logging();

    if let Some(path) = env_file {
        info!("Environment loaded from {}", path);
    }

    let settings = ServerSettings::from_env()?;
    info!(
        "Starting flowdeck-server v{} on {}",
        env!("CARGO_PKG_VERSION"),
        settings.bind_addr()
    );

    let state = Arc::new(AppState::in_memory());
    let app = create_router(state, settings.static_dir.clone());

    let server = HttpServer::builder()
        .bind(settings.bind_addr())
        .cors_origins(settings.cors_origins.clone())
        .compression(settings.compression)
        .timeout(settings.request_timeout)
        .router(app)
        .build();

    server.serve().await?;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::get_config("FLOWDECK_LOG", DEFAULT_LOG_FILTER)));

    if config::get_config_bool("FLOWDECK_LOG_JSON", false) {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().compact())
            .with(filter)
            .init();
    }
}
