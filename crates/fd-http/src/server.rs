//! HTTP Server Implementation
//!
//! Binds the composed router and serves it until a shutdown signal arrives.

use crate::middleware::{apply_middleware, MiddlewareConfig};
use crate::{Result, ServerError};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// HTTP port
    pub http_port: u16,
    /// Bind host
    pub bind_host: String,
    /// Public hostname for logging/display
    pub public_host: String,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_host, self.http_port)
            .parse()
            .map_err(|_| {
                ServerError::InvalidAddress(format!("{}:{}", self.bind_host, self.http_port))
            })
    }
}

/// Central HTTP Server
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn builder() -> HttpServerBuilder {
        HttpServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The fully layered router, for in-process use and tests
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Serve until `signal` resolves
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;

        info!("HTTP server listening on http://{}", listener.local_addr()?);
        info!(
            "Public URL: http://{}:{}",
            self.config.public_host, self.config.http_port
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(signal)
            .await
            .map_err(ServerError::BindError)?;

        info!("Server shutdown complete");
        Ok(())
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        },
    }
}

/// Builder for HttpServer
pub struct HttpServerBuilder {
    bind_host: String,
    http_port: u16,
    public_host: Option<String>,
    router: Option<Router>,
    middleware_config: MiddlewareConfig,
}

impl HttpServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            http_port: 8080,
            public_host: None,
            router: None,
            middleware_config: MiddlewareConfig::default(),
        }
    }

    /// Set bind address (host:port format or just port)
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        let addr = addr.into();
        if let Some((host, port)) = addr.rsplit_once(':') {
            self.bind_host = host.to_string();
            if let Ok(p) = port.parse() {
                self.http_port = p;
            }
        } else if let Ok(p) = addr.parse::<u16>() {
            self.http_port = p;
        }
        self
    }

    pub fn public_host(mut self, host: impl Into<String>) -> Self {
        self.public_host = Some(host.into());
        self
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    pub fn middleware(mut self, config: MiddlewareConfig) -> Self {
        self.middleware_config = config;
        self
    }

    pub fn cors_origins(mut self, origins: Option<Vec<String>>) -> Self {
        self.middleware_config = self.middleware_config.cors_origins(origins);
        self
    }

    pub fn compression(mut self, enabled: bool) -> Self {
        self.middleware_config = self.middleware_config.compression(enabled);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.middleware_config = self.middleware_config.timeout(timeout);
        self
    }

    /// Build the server
    pub fn build(self) -> HttpServer {
        let router = self.router.unwrap_or_default();
        let router = apply_middleware(router, self.middleware_config);

        let public_host = self
            .public_host
            .unwrap_or_else(|| gethostname::gethostname().to_string_lossy().to_string());

        let config = ServerConfig {
            http_port: self.http_port,
            bind_host: self.bind_host,
            public_host,
        };

        HttpServer { config, router }
    }
}

impl Default for HttpServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
