//! Middleware
//!
//! Applied once, to the fully composed router, by `HttpServerBuilder::build`.

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::time::{Duration, Instant};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Layers applied around every flowdeck route. Tracing spans and CORS
/// are always on; the rest follows the server settings.
#[derive(Debug, Clone)]
pub struct MiddlewareConfig {
    /// Allowed CORS origins; `None` allows any origin
    pub cors_origins: Option<Vec<String>>,
    pub compression_enabled: bool,
    /// Requests running longer than this get a 408
    pub timeout: Duration,
    /// nosniff / frame / referrer headers on every response
    pub security_headers: bool,
    /// One log line per request with status and latency
    pub request_logging: bool,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            cors_origins: None,
            compression_enabled: true,
            timeout: Duration::from_secs(30),
            security_headers: true,
            request_logging: true,
        }
    }
}

impl MiddlewareConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cors_origins(mut self, origins: Option<Vec<String>>) -> Self {
        self.cors_origins = origins;
        self
    }

    pub fn compression(mut self, enabled: bool) -> Self {
        self.compression_enabled = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn security_headers(mut self, enabled: bool) -> Self {
        self.security_headers = enabled;
        self
    }

    pub fn request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        match &self.cors_origins {
            Some(origins) => {
                let allowed: Vec<HeaderValue> =
                    origins.iter().filter_map(|o| o.parse().ok()).collect();
                if allowed.len() < origins.len() {
                    tracing::warn!("Ignoring unparseable CORS origins in {:?}", origins);
                }
                layer.allow_origin(allowed)
            }
            None => layer.allow_origin(Any),
        }
    }
}

/// Wrap `router` in the configured layers. Layers added first sit
/// closest to the handlers.
pub fn apply_middleware(mut router: Router, config: MiddlewareConfig) -> Router {
    if config.security_headers {
        router = router.layer(middleware::from_fn(security_headers_middleware));
    }
    if config.request_logging {
        router = router.layer(middleware::from_fn(request_logging_middleware));
    }

    router = router.layer(TimeoutLayer::new(config.timeout));
    if config.compression_enabled {
        router = router.layer(CompressionLayer::new());
    }

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(config.cors_layer())
}

async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        tracing::error!(%method, %uri, status, elapsed_ms, "request failed");
    } else if response.status().is_client_error() {
        tracing::warn!(%method, %uri, status, elapsed_ms, "request rejected");
    } else {
        tracing::info!(%method, %uri, status, elapsed_ms, "request served");
    }

    response
}
