//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the proxy and health handlers
//! - Wire up middleware (tracing, request ID, CORS, timeout)
//! - Bind server to listener and shut down gracefully
//! - Hand each request's target to the pipeline and render the outcome

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::guard::ResolveError;
use crate::http::cors::cors_layers;
use crate::http::request::{request_id, target_param, UuidRequestId, X_REQUEST_ID};
use crate::lifecycle::Shutdown;
use crate::pipeline::ProxyPipeline;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ProxyPipeline>,
}

/// HTTP front end of the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server backed by the production pipeline.
    pub fn new(config: ProxyConfig) -> Result<Self, ResolveError> {
        let pipeline = ProxyPipeline::from_config(&config)?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create a server around an already assembled pipeline.
    pub fn with_pipeline(config: ProxyConfig, pipeline: ProxyPipeline) -> Self {
        let state = AppState {
            pipeline: Arc::new(pipeline),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(proxy_handler))
            .route("/healthz", get(health_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        if config.cors.enabled {
            for layer in cors_layers(&config.cors) {
                router = router.layer(layer);
            }
        }

        router
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The router, for serving on a custom listener or in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            fetch_timeout_ms = self.config.timeouts.fetch_ms,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(Shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Proxy handler: `GET /?uri=<target>`.
async fn proxy_handler(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let candidate = target_param(query.as_deref());
    state.pipeline.run(candidate.as_deref()).await.into_response()
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
