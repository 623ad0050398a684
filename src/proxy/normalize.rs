//! Response normalization: backend outcome → browser contract.
//!
//! # Responsibilities
//! - Decode and reshape successful JSON payloads
//! - Re-emit binary payloads with content type and disposition
//! - Re-wrap backend errors into the route's own error shape
//! - Map transport failures to 500 (504 for timeouts)
//!
//! # Design Decisions
//! - Pure functions of `(route, outcome)`; no state
//! - Raw backend error bodies are logged, never returned

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

use crate::proxy::error::ProxyError;
use crate::proxy::forward::{BackendResponse, TransportError};
use crate::proxy::route::{BinaryShape, JsonShape, ResponseShape, RouteSpec};

/// Longest backend error excerpt written to logs.
const LOG_EXCERPT_LEN: usize = 512;

/// Successful reply for the browser.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Json(Value),
    Binary {
        content_type: String,
        disposition: String,
        body: Bytes,
    },
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(value) => (StatusCode::OK, Json(value)).into_response(),
            Reply::Binary {
                content_type,
                disposition,
                body,
            } => {
                let mut response = Response::new(Body::from(body));
                let headers = response.headers_mut();
                if let Ok(v) = HeaderValue::from_str(&content_type) {
                    headers.insert(header::CONTENT_TYPE, v);
                }
                if let Ok(v) = HeaderValue::from_str(&disposition) {
                    headers.insert(header::CONTENT_DISPOSITION, v);
                }
                response
            }
        }
    }
}

/// Turn the forwarder's outcome into a reply or a tagged error.
pub fn normalize(
    route: &RouteSpec,
    filename: Option<&str>,
    outcome: Result<BackendResponse, TransportError>,
) -> Result<Reply, ProxyError> {
    let response = outcome.map_err(|e| transport_error(route, &e))?;

    if !response.status.is_success() {
        return Err(upstream_error(route, &response));
    }

    match &route.response {
        ResponseShape::Json(shape) => {
            let value: Value = serde_json::from_slice(&response.body).map_err(|e| {
                tracing::warn!(route = route.name, error = %e, "Backend sent malformed JSON");
                ProxyError::Unreachable(format!("{}: invalid backend response", route.error.message))
            })?;
            Ok(Reply::Json(shape_json(shape, value)))
        }
        ResponseShape::Binary(shape) => Ok(binary_reply(shape, filename, response)),
    }
}

/// Map a backend non-2xx reply to the route's error.
pub fn upstream_error(route: &RouteSpec, response: &BackendResponse) -> ProxyError {
    tracing::warn!(
        route = route.name,
        status = %response.status,
        body = %excerpt(&response.body),
        "Backend returned an error"
    );

    if response.status == StatusCode::NOT_FOUND {
        if let Some(message) = route.error.not_found {
            return ProxyError::NotFound(message.to_string());
        }
    }

    ProxyError::Upstream {
        status: response.status,
        message: format!(
            "{}: backend responded with {}",
            route.error.message, response.status
        ),
    }
}

/// Map a transport failure to the route's error.
pub fn transport_error(route: &RouteSpec, err: &TransportError) -> ProxyError {
    tracing::error!(route = route.name, error = %err, "Backend call failed");
    match err {
        TransportError::Timeout(_) => {
            ProxyError::Timeout(format!("{}: backend timed out", route.error.message))
        }
        _ => ProxyError::Unreachable(format!("{}: backend unreachable", route.error.message)),
    }
}

/// Apply renames, array guarantees and projection to a JSON payload.
pub fn shape_json(shape: &JsonShape, value: Value) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };

    for (from, to) in shape.renames {
        if let Some(v) = map.remove(*from) {
            map.insert((*to).to_string(), v);
        }
    }

    for key in shape.ensure_arrays {
        let needs_default = map.get(*key).map_or(true, Value::is_null);
        if needs_default {
            map.insert((*key).to_string(), Value::Array(Vec::new()));
        }
    }

    if let Some(keys) = shape.select {
        map = keys
            .iter()
            .filter_map(|k| map.get(*k).map(|v| ((*k).to_string(), v.clone())))
            .collect::<Map<String, Value>>();
    }

    Value::Object(map)
}

fn binary_reply(shape: &BinaryShape, filename: Option<&str>, response: BackendResponse) -> Reply {
    let content_type = response
        .content_type
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or_else(|| shape.default_content_type.to_string());

    let disposition = match filename.map(sanitize_filename).filter(|n| !n.is_empty()) {
        Some(name) => format!("{}; filename=\"{}\"", shape.disposition.as_str(), name),
        None => shape.disposition.as_str().to_string(),
    };

    Reply::Binary {
        content_type,
        disposition,
        body: response.body,
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect()
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let cut = text.char_indices().nth(LOG_EXCERPT_LEN).map(|(idx, _)| idx);
    match cut {
        Some(idx) => format!("{}…", &text[..idx]),
        None => text.into_owned(),
    }
}

/// Render an error in the route's shape.
///
/// JSON routes get `{"error": message}` plus their fallback arrays; binary
/// routes get a plain-text body.
pub fn error_response(route: &RouteSpec, err: &ProxyError) -> Response {
    let status = err.status();

    if route.is_binary() {
        return (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            err.to_string(),
        )
            .into_response();
    }

    let mut body = Map::new();
    body.insert("error".to_string(), Value::String(err.to_string()));
    for key in route.error.fallback_arrays {
        body.insert((*key).to_string(), Value::Array(Vec::new()));
    }
    (status, Json(Value::Object(body))).into_response()
}
