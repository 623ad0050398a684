//! Route handlers.
//!
//! # Responsibilities
//! - Gate the request before touching its body
//! - Read the inbound payload in the shape the route declares
//! - Run the proxy pipeline and render its outcome
//! - Record per-route metrics
//!
//! # Design Decisions
//! - One generic handler; the route table supplies all variation
//! - Body extraction failures are client errors (400/413), never 500
//! - The request deadline and body limit are enforced here, not by outer
//!   layers, so breaching either still yields the route's error shape

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, FromRequestParts, Multipart, Path, Request},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::config::GatewayConfig;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::proxy::{
    authenticate, error_response, execute,
    route::InboundKind,
    translate::{parse_json_body, FormPart},
    InboundBody, InboundRequest, ProxyError, Reply, RouteSpec,
};

/// Bounds applied to every proxied request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// Largest accepted request body in bytes.
    pub max_body_size: usize,
    /// Total time allowed for reading, forwarding and normalizing.
    pub deadline: Duration,
}

impl RequestLimits {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            max_body_size: config.security.max_body_size,
            deadline: Duration::from_secs(config.timeouts.request_secs),
        }
    }
}

/// Handle one proxied request for `route`.
pub async fn proxy_route(
    state: AppState,
    route: &'static RouteSpec,
    limits: RequestLimits,
    request: Request,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(request.headers());

    let outcome = tokio::time::timeout(
        limits.deadline,
        handle(&state, route, limits, request, request_id.clone()),
    )
    .await
    .unwrap_or_else(|_| {
        Err(ProxyError::Timeout(format!(
            "{}: request timed out",
            route.error.message
        )))
    });

    let response = match outcome {
        Ok(reply) => reply.into_response(),
        Err(err) => {
            let status = err.status();
            if status.is_server_error() {
                tracing::error!(
                    route = route.name,
                    request_id = request_id.as_deref().unwrap_or("-"),
                    status = status.as_u16(),
                    error = %err,
                    "Request failed"
                );
            } else {
                tracing::info!(
                    route = route.name,
                    request_id = request_id.as_deref().unwrap_or("-"),
                    status = status.as_u16(),
                    kind = err.kind(),
                    "Request rejected"
                );
            }
            error_response(route, &err)
        }
    };

    metrics::record_request(route.name, response.status().as_u16(), start);
    response
}

async fn handle(
    state: &AppState,
    route: &'static RouteSpec,
    limits: RequestLimits,
    request: Request,
    request_id: Option<String>,
) -> Result<Reply, ProxyError> {
    let principal = authenticate(state.identity.as_ref(), request.headers())?;

    // Chunked bodies are caught while reading; a declared length is checked up front.
    if declared_length(request.headers()).is_some_and(|len| len > limits.max_body_size as u64) {
        return Err(too_large());
    }

    let (mut parts, body) = request.into_parts();
    let filename = if route.takes_filename() {
        Some(path_filename(&mut parts, state).await?)
    } else {
        None
    };

    let body = read_body(route.inbound, parts, body).await?;

    let mut inbound = InboundRequest::new(body);
    inbound.filename = filename;
    inbound.request_id = request_id;

    execute(
        route,
        &principal,
        inbound,
        state.identity.as_ref(),
        state.forwarder.as_ref(),
    )
    .await
}

async fn path_filename(parts: &mut Parts, state: &AppState) -> Result<String, ProxyError> {
    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map_err(|_| ProxyError::bad_request("Invalid filename"))?;
    params
        .get("filename")
        .cloned()
        .ok_or_else(|| ProxyError::bad_request("Filename is required"))
}

async fn read_body(kind: InboundKind, parts: Parts, body: Body) -> Result<InboundBody, ProxyError> {
    match kind {
        InboundKind::Empty => Ok(InboundBody::Empty),
        InboundKind::Json => {
            let request = Request::from_parts(parts, body);
            let bytes = Bytes::from_request(request, &())
                .await
                .map_err(|rejection| body_error(rejection.status(), "Failed to read request body"))?;
            parse_json_body(&bytes).map(InboundBody::Json)
        }
        InboundKind::Multipart => {
            let request = Request::from_parts(parts, body);
            let multipart = Multipart::from_request(request, &())
                .await
                .map_err(|rejection| body_error(rejection.status(), "Expected a multipart form upload"))?;
            read_form(multipart).await.map(InboundBody::Form)
        }
        InboundKind::Query => {
            let pairs = parts
                .uri
                .query()
                .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
                .unwrap_or_default();
            Ok(InboundBody::Query(pairs))
        }
    }
}

fn declared_length(headers: &axum::http::HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn too_large() -> ProxyError {
    ProxyError::PayloadTooLarge("Request body too large".to_string())
}

/// Extractor rejections carry their own status; only the size limit is not a 400.
fn body_error(status: StatusCode, message: &str) -> ProxyError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        too_large()
    } else {
        ProxyError::bad_request(message)
    }
}

async fn read_form(mut multipart: Multipart) -> Result<Vec<FormPart>, ProxyError> {
    let malformed = |err: axum::extract::multipart::MultipartError| {
        body_error(err.status(), "Malformed multipart form")
    };

    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(malformed)?;
        parts.push(FormPart {
            name,
            file_name,
            content_type,
            data,
        });
    }
    Ok(parts)
}

/// Liveness probe; no identity required.
pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Any path outside the route table.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}
