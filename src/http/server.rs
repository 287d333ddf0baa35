//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay route
//! - Wire up middleware (CORS, request ID, tracing, timeout, limits)
//! - Bind server to listener
//! - Run the relay pipeline per request and shape its answer

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::request::ValidRelay;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::relay::{Relay, UpstreamOutcome};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    config: RelayConfig,
}

impl RelayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let state = AppState {
            relay: Arc::new(Relay::new(&config)?),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/", post(relay_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.inbound_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        if config.cors.enabled {
            router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            router
        }
    }

    /// Run the server until `shutdown` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The fully layered router, for driving it without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Relay handler: validated request in, relay outcome out.
async fn relay_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidRelay(request): ValidRelay,
) -> Response {
    let start_time = Instant::now();
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    let method = request.method.as_str();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        url = %request.url,
        "Relaying request"
    );

    match state.relay.run(&request).await {
        Ok(outcome) => {
            let kind = outcome.kind();
            match &outcome {
                UpstreamOutcome::Forward(upstream) => tracing::warn!(
                    request_id = %request_id,
                    url = %request.url,
                    status = %upstream.status(),
                    "Upstream answered with error status"
                ),
                _ => tracing::debug!(
                    request_id = %request_id,
                    outcome = kind,
                    "Relay complete"
                ),
            }
            metrics::record_relay(method, kind, start_time);
            outcome.into_response()
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                url = %request.url,
                kind = e.kind(),
                error = %e,
                "Relay failed"
            );
            metrics::record_relay(method, e.kind(), start_time);
            e.into_response()
        }
    }
}
