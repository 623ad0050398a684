//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router from the route table
//! - Wire up middleware (tracing, limits, request ID, security headers)
//! - Bind server to listener
//! - Stop accepting on shutdown and drain in-flight requests

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::handlers::{healthz, not_found, proxy_route, RequestLimits};
use crate::http::request::{request_id_header, MakeRequestUuid};
use crate::identity::IdentityProvider;
use crate::proxy::route::Verb;
use crate::proxy::{Forwarder, ROUTES};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub forwarder: Arc<dyn Forwarder>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and state.
    pub fn new(config: GatewayConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The request deadline and body limit live in the route handler so a
    /// breach is rendered with that route's error shape.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let limits = RequestLimits::from_config(config);
        let mut router = Router::new().route("/healthz", get(healthz));

        for route in ROUTES {
            let handler = move |State(state): State<AppState>, request: Request| {
                proxy_route(state, route, limits, request)
            };
            let method_router = match route.method {
                Verb::Get => get(handler),
                Verb::Post => post(handler),
            };
            router = router.route(route.path, method_router);
        }

        let router = router
            .fallback(not_found)
            .with_state(state)
            .layer(DefaultBodyLimit::max(limits.max_body_size))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuid));

        if config.security.enable_headers {
            router.layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
        } else {
            router
        }
    }

    /// The configured router, for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = ROUTES.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
