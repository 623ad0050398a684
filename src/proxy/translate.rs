//! Request translation: browser payload → backend payload.
//!
//! # Responsibilities
//! - Validate required fields before any network call
//! - Coerce numeric strings and fill defaults
//! - Inject the principal id where the backend expects it
//! - Build the backend path from its template
//!
//! # Design Decisions
//! - Only declared fields are forwarded
//! - `null` and empty strings count as absent; `0` does not
//! - A `ForwardedRequest` can only be built from a resolved `Principal`

use axum::body::Bytes;
use serde_json::{Map, Number, Value};

use crate::identity::Principal;
use crate::proxy::error::ProxyError;
use crate::proxy::route::{FieldKind, FieldRule, IdentityPlacement, InboundKind, RouteSpec, Service, Verb};

/// One part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: Bytes::from(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<&str>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: content_type.map(str::to_string),
            data: data.into(),
        }
    }

    fn is_file(&self) -> bool {
        self.file_name.as_deref().is_some_and(|n| !n.is_empty())
    }

    fn text_value(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

/// Payload as the browser sent it.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundBody {
    Empty,
    Json(Map<String, Value>),
    Form(Vec<FormPart>),
    Query(Vec<(String, String)>),
}

/// Everything the translator needs from the inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundRequest {
    pub body: InboundBody,
    /// The `{filename}` path parameter, when the route has one.
    pub filename: Option<String>,
    pub request_id: Option<String>,
}

impl InboundRequest {
    pub fn new(body: InboundBody) -> Self {
        Self {
            body,
            filename: None,
            request_id: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Payload sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// A fully translated backend call. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardedRequest {
    route: &'static str,
    service: Service,
    method: Verb,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: OutboundBody,
    bearer: Option<String>,
    request_id: Option<String>,
}

impl ForwardedRequest {
    pub fn route(&self) -> &'static str {
        self.route
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn method(&self) -> Verb {
        self.method
    }

    /// Unescaped backend path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Backend path for logging, e.g. `/api/settings/user_1`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> &OutboundBody {
        &self.body
    }

    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn into_body(self) -> OutboundBody {
        self.body
    }
}

/// Parse a JSON request body. An empty body is an empty object.
pub fn parse_json_body(bytes: &[u8]) -> Result<Map<String, Value>, ProxyError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ProxyError::bad_request("Request body must be a JSON object")),
        Err(_) => Err(ProxyError::bad_request("Invalid JSON body")),
    }
}

/// Translate an inbound request for `route` on behalf of `principal`.
pub fn translate(
    route: &RouteSpec,
    principal: &Principal,
    inbound: InboundRequest,
    bearer: Option<String>,
) -> Result<ForwardedRequest, ProxyError> {
    let segments = backend_segments(route, principal, inbound.filename.as_deref())?;

    let mut query = Vec::new();
    let mut body = match route.inbound {
        InboundKind::Empty => OutboundBody::Empty,
        InboundKind::Json => OutboundBody::Json(translate_json(route, inbound.body)?),
        InboundKind::Multipart => OutboundBody::Multipart(translate_form(route, inbound.body)?),
        InboundKind::Query => {
            query = translate_query(route, inbound.body)?;
            OutboundBody::Empty
        }
    };

    inject_identity(route.identity, principal, &mut body, &mut query);

    Ok(ForwardedRequest {
        route: route.name,
        service: route.service,
        method: route.backend_method,
        segments,
        query,
        body,
        bearer,
        request_id: inbound.request_id,
    })
}

fn inject_identity(
    placement: IdentityPlacement,
    principal: &Principal,
    body: &mut OutboundBody,
    query: &mut Vec<(String, String)>,
) {
    let user_id = principal.user_id();
    match placement {
        IdentityPlacement::BodyField(name) => match body {
            OutboundBody::Json(Value::Object(map)) => {
                map.insert(name.to_string(), Value::String(user_id.to_string()));
            }
            _ => {
                let mut map = Map::new();
                map.insert(name.to_string(), Value::String(user_id.to_string()));
                *body = OutboundBody::Json(Value::Object(map));
            }
        },
        IdentityPlacement::FormField(name) => {
            let part = FormPart::text(name, user_id);
            match body {
                OutboundBody::Multipart(parts) => {
                    parts.retain(|p| p.name != name);
                    parts.push(part);
                }
                _ => *body = OutboundBody::Multipart(vec![part]),
            }
        }
        IdentityPlacement::QueryParam(name) => {
            query.retain(|(k, _)| k != name);
            query.push((name.to_string(), user_id.to_string()));
        }
        IdentityPlacement::PathSegment | IdentityPlacement::GateOnly => {}
    }
}

fn backend_segments(
    route: &RouteSpec,
    principal: &Principal,
    filename: Option<&str>,
) -> Result<Vec<String>, ProxyError> {
    route
        .backend_path
        .strip_prefix('/')
        .unwrap_or(route.backend_path)
        .split('/')
        .map(|segment| match segment {
            "{user_id}" => Ok(principal.user_id().to_string()),
            "{filename}" => {
                let name = filename.ok_or_else(|| ProxyError::bad_request("Filename is required"))?;
                validate_filename(name)?;
                Ok(name.to_string())
            }
            literal => Ok(literal.to_string()),
        })
        .collect()
}

/// Reject names that could escape the backend's report directory.
pub fn validate_filename(name: &str) -> Result<(), ProxyError> {
    let invalid = name.is_empty()
        || name.len() > 255
        || name.contains(|c| c == '/' || c == '\\')
        || name.contains("..")
        || name.chars().any(char::is_control);
    if invalid {
        Err(ProxyError::bad_request("Invalid filename"))
    } else {
        Ok(())
    }
}

fn missing(rule: &FieldRule) -> ProxyError {
    if rule.kind == FieldKind::File {
        ProxyError::bad_request("No file provided")
    } else {
        ProxyError::bad_request(format!("Missing required field: {}", rule.name))
    }
}

fn translate_json(route: &RouteSpec, body: InboundBody) -> Result<Value, ProxyError> {
    let mut inbound = match body {
        InboundBody::Json(map) => map,
        InboundBody::Empty => Map::new(),
        InboundBody::Form(_) | InboundBody::Query(_) => {
            return Err(ProxyError::bad_request("Expected a JSON body"));
        }
    };

    if let Some(key) = route.wrap_body {
        if inbound.is_empty() {
            return Err(ProxyError::bad_request(format!("Missing required field: {key}")));
        }
        let mut out = Map::new();
        out.insert(key.to_string(), Value::Object(inbound));
        return Ok(Value::Object(out));
    }

    let mut out = Map::new();
    for rule in route.fields {
        let value = inbound.remove(rule.name).filter(|v| !is_blank(v));
        match value {
            Some(v) => {
                out.insert(rule.backend_name().to_string(), coerce_json(rule, v)?);
            }
            None if rule.required => return Err(missing(rule)),
            None => {
                if let Some(default) = rule.default {
                    out.insert(rule.backend_name().to_string(), Value::String(default.to_string()));
                }
            }
        }
    }
    Ok(Value::Object(out))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn coerce_json(rule: &FieldRule, value: Value) -> Result<Value, ProxyError> {
    match rule.kind {
        FieldKind::Any => Ok(value),
        FieldKind::Text => match value {
            Value::String(_) => Ok(value),
            _ => Err(ProxyError::bad_request(format!("Field {} must be a string", rule.name))),
        },
        FieldKind::Number => match value {
            Value::Number(_) => Ok(value),
            Value::String(s) => parse_number(&s)
                .map(Value::Number)
                .ok_or_else(|| not_a_number(rule)),
            _ => Err(not_a_number(rule)),
        },
        FieldKind::File => Err(ProxyError::bad_request(format!(
            "Field {} must be uploaded as a file",
            rule.name
        ))),
    }
}

fn not_a_number(rule: &FieldRule) -> ProxyError {
    ProxyError::bad_request(format!("Field {} must be a number", rule.name))
}

fn parse_number(raw: &str) -> Option<Number> {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Number::from(i));
    }
    raw.parse::<f64>().ok().and_then(Number::from_f64)
}

fn translate_form(route: &RouteSpec, body: InboundBody) -> Result<Vec<FormPart>, ProxyError> {
    let parts = match body {
        InboundBody::Form(parts) => parts,
        _ => return Err(ProxyError::bad_request("Expected a multipart form upload")),
    };

    let mut out = Vec::new();
    for rule in route.fields {
        let part = parts.iter().find(|p| p.name == rule.name);
        let backend_name = rule.backend_name();

        match rule.kind {
            FieldKind::File => match part {
                Some(p) if p.is_file() && !p.data.is_empty() => {
                    out.push(FormPart {
                        name: backend_name.to_string(),
                        ..p.clone()
                    });
                }
                _ if rule.required => return Err(missing(rule)),
                _ => {}
            },
            FieldKind::Text | FieldKind::Number | FieldKind::Any => {
                let text = match part {
                    Some(p) if p.is_file() => {
                        return Err(ProxyError::bad_request(format!(
                            "Field {} must not be a file",
                            rule.name
                        )));
                    }
                    Some(p) => Some(p.text_value().ok_or_else(|| {
                        ProxyError::bad_request(format!("Field {} must be UTF-8 text", rule.name))
                    })?),
                    None => None,
                }
                .map(str::trim)
                .filter(|t| !t.is_empty());

                match text {
                    Some(t) => {
                        if rule.kind == FieldKind::Number && parse_number(t).is_none() {
                            return Err(not_a_number(rule));
                        }
                        out.push(FormPart::text(backend_name, t));
                    }
                    None if rule.required => return Err(missing(rule)),
                    None => {
                        if let Some(default) = rule.default {
                            out.push(FormPart::text(backend_name, default));
                        }
                    }
                }
            }
        }
    }
    Ok(out)
}

fn translate_query(route: &RouteSpec, body: InboundBody) -> Result<Vec<(String, String)>, ProxyError> {
    let pairs = match body {
        InboundBody::Query(pairs) => pairs,
        InboundBody::Empty => Vec::new(),
        _ => return Err(ProxyError::bad_request("Expected query parameters")),
    };

    let mut out = Vec::new();
    for rule in route.fields {
        let value = pairs
            .iter()
            .find(|(k, _)| k == rule.name)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty());

        match value {
            Some(v) => {
                if rule.kind == FieldKind::Number && parse_number(v).is_none() {
                    return Err(not_a_number(rule));
                }
                out.push((rule.backend_name().to_string(), v.to_string()));
            }
            None if rule.required => return Err(missing(rule)),
            None => {
                if let Some(default) = rule.default {
                    out.push((rule.backend_name().to_string(), default.to_string()));
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::catalog;
    use crate::proxy::route::{ErrorShape, JsonShape, ResponseShape};
    use serde_json::json;

    fn principal() -> Principal {
        Principal::new("user_1")
    }

    fn json_body(value: Value) -> InboundRequest {
        match value {
            Value::Object(map) => InboundRequest::new(InboundBody::Json(map)),
            _ => panic!("object expected"),
        }
    }

    fn body_json(req: &ForwardedRequest) -> &Value {
        match req.body() {
            OutboundBody::Json(v) => v,
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_json_body() {
        assert!(parse_json_body(b"").unwrap().is_empty());
        assert!(parse_json_body(b"  \n").unwrap().is_empty());
        assert_eq!(parse_json_body(br#"{"a":1}"#).unwrap()["a"], json!(1));
        assert_eq!(parse_json_body(b"[1,2]").unwrap_err().status(), 400);
        assert_eq!(parse_json_body(b"{nope").unwrap_err().status(), 400);
    }

    #[test]
    fn test_identity_injected_into_body() {
        let req = translate(
            &catalog::ASK,
            &principal(),
            json_body(json!({"question": "How much did I spend?", "extra": true})),
            None,
        )
        .unwrap();

        assert_eq!(
            body_json(&req),
            &json!({"question": "How much did I spend?", "user_id": "user_1"})
        );
        assert_eq!(req.path(), "/ask-ai/");
    }

    #[test]
    fn test_spoofed_identity_overwritten() {
        let req = translate(
            &catalog::REPORT,
            &principal(),
            json_body(json!({"user_id": "someone_else"})),
            None,
        )
        .unwrap();
        assert_eq!(body_json(&req), &json!({"user_id": "user_1"}));
    }

    #[test]
    fn test_missing_required_field() {
        let err = translate(&catalog::ASK, &principal(), json_body(json!({})), None).unwrap_err();
        assert_eq!(err, ProxyError::bad_request("Missing required field: question"));

        let err = translate(
            &catalog::ASK,
            &principal(),
            json_body(json!({"question": "   "})),
            None,
        )
        .unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_settings_number_coercion() {
        let req = translate(
            &catalog::SETTINGS,
            &principal(),
            json_body(json!({"salary": "5200.50", "limit": 1500})),
            None,
        )
        .unwrap();
        assert_eq!(
            body_json(&req),
            &json!({"salary": 5200.5, "limit": 1500, "user_id": "user_1"})
        );
    }

    #[test]
    fn test_settings_missing_limit() {
        let err = translate(
            &catalog::SETTINGS,
            &principal(),
            json_body(json!({"salary": 5000})),
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProxyError::bad_request("Missing required field: limit"));
    }

    #[test]
    fn test_settings_zero_is_present_but_text_is_not_a_number() {
        assert!(translate(
            &catalog::SETTINGS,
            &principal(),
            json_body(json!({"salary": 0, "limit": 0})),
            None,
        )
        .is_ok());

        let err = translate(
            &catalog::SETTINGS,
            &principal(),
            json_body(json!({"salary": "lots", "limit": 10})),
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProxyError::bad_request("Field salary must be a number"));
    }

    #[test]
    fn test_rename_and_default() {
        let req = translate(
            &catalog::QUERY_DOCUMENT,
            &principal(),
            json_body(json!({"query": "Summarize", "filename": "q3.pdf"})),
            None,
        )
        .unwrap();
        let body = body_json(&req);
        assert_eq!(body["document_path"], json!("q3.pdf"));
        assert!(body.get("filename").is_none());

        let req = translate(
            &catalog::GENERATE_ORGANIZATION_REPORT,
            &principal(),
            json_body(json!({"symbol": "AAPL"})),
            None,
        )
        .unwrap();
        assert_eq!(body_json(&req)["data_type"], json!("organization"));
    }

    #[test]
    fn test_wrap_body() {
        let req = translate(
            &catalog::UPDATE_PREFERENCES,
            &principal(),
            json_body(json!({"risk": "low"})),
            None,
        )
        .unwrap();
        assert_eq!(
            body_json(&req),
            &json!({"preferences": {"risk": "low"}, "user_id": "user_1"})
        );

        let err = translate(&catalog::UPDATE_PREFERENCES, &principal(), json_body(json!({})), None)
            .unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_multipart_forwarding() {
        let inbound = InboundRequest::new(InboundBody::Form(vec![
            FormPart::file("file", "receipt.pdf", Some("application/pdf"), &b"%PDF-1.4"[..]),
            FormPart::text("user_id", "spoofed"),
            FormPart::text("unrelated", "x"),
        ]));
        let req = translate(&catalog::UPLOAD_DOCUMENT, &principal(), inbound, None).unwrap();

        let OutboundBody::Multipart(parts) = req.body() else {
            panic!("multipart expected");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].file_name.as_deref(), Some("receipt.pdf"));
        assert_eq!(parts[0].content_type.as_deref(), Some("application/pdf"));
        assert_eq!(parts[1], FormPart::text("user_id", "user_1"));
        assert_eq!(req.service(), Service::Documents);
    }

    #[test]
    fn test_multipart_without_file_is_bad_request() {
        let inbound = InboundRequest::new(InboundBody::Form(vec![FormPart::text("note", "hi")]));
        let err = translate(&catalog::UPLOAD_DOCUMENT, &principal(), inbound, None).unwrap_err();
        assert_eq!(err, ProxyError::bad_request("No file provided"));

        // Empty file data counts as no file.
        let inbound = InboundRequest::new(InboundBody::Form(vec![FormPart::file(
            "file",
            "empty.pdf",
            None,
            Bytes::new(),
        )]));
        assert!(translate(&catalog::UPLOAD_DOCUMENT, &principal(), inbound, None).is_err());

        // A JSON body sent to an upload route.
        let err = translate(
            &catalog::UPLOAD_DOCUMENT,
            &principal(),
            json_body(json!({"file": "x"})),
            None,
        )
        .unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_form_default_field() {
        let inbound = InboundRequest::new(InboundBody::Form(vec![FormPart::file(
            "file",
            "ledger.csv",
            Some("text/csv"),
            &b"a,b\n1,2"[..],
        )]));
        let req = translate(&catalog::GENERATE_USER_REPORT, &principal(), inbound, None).unwrap();
        let OutboundBody::Multipart(parts) = req.body() else {
            panic!("multipart expected");
        };
        assert!(parts.contains(&FormPart::text("data_type", "individual")));
    }

    #[test]
    fn test_path_identity_and_bearer() {
        let req = translate(
            &catalog::ANALYSIS,
            &principal(),
            InboundRequest::new(InboundBody::Empty),
            Some("tok".into()),
        )
        .unwrap();
        assert_eq!(req.path(), "/api/analysis/user_1");
        assert_eq!(req.bearer(), Some("tok"));
        assert_eq!(req.body(), &OutboundBody::Empty);
    }

    #[test]
    fn test_query_identity() {
        let req = translate(
            &catalog::USER_FILES,
            &principal(),
            InboundRequest::new(InboundBody::Query(vec![("user_id".into(), "spoof".into())])),
            None,
        )
        .unwrap();
        assert_eq!(req.query(), &[("user_id".to_string(), "user_1".to_string())]);
    }

    #[test]
    fn test_query_fields() {
        const SEARCH: RouteSpec = RouteSpec {
            name: "search",
            path: "/api/search",
            method: Verb::Get,
            service: Service::Documents,
            backend_method: Verb::Get,
            backend_path: "/search",
            inbound: InboundKind::Query,
            fields: &[
                FieldRule::required("q", FieldKind::Text),
                FieldRule::optional("page", FieldKind::Number).with_default("1"),
            ],
            identity: IdentityPlacement::QueryParam("uid"),
            wrap_body: None,
            bearer: false,
            response: ResponseShape::Json(JsonShape::PASSTHROUGH),
            error: ErrorShape::message("Failed to search"),
        };

        let req = translate(
            &SEARCH,
            &principal(),
            InboundRequest::new(InboundBody::Query(vec![("q".into(), "rent".into())])),
            None,
        )
        .unwrap();
        assert_eq!(
            req.query(),
            &[
                ("q".to_string(), "rent".to_string()),
                ("page".to_string(), "1".to_string()),
                ("uid".to_string(), "user_1".to_string()),
            ]
        );

        let err = translate(&SEARCH, &principal(), InboundRequest::new(InboundBody::Empty), None)
            .unwrap_err();
        assert_eq!(err, ProxyError::bad_request("Missing required field: q"));

        let err = translate(
            &SEARCH,
            &principal(),
            InboundRequest::new(InboundBody::Query(vec![
                ("q".into(), "rent".into()),
                ("page".into(), "two".into()),
            ])),
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProxyError::bad_request("Field page must be a number"));
    }

    #[test]
    fn test_filename_validation() {
        for bad in ["", "../secret.pdf", "a/b.png", "a\\b.png", "x\u{0}.png", ".."] {
            let inbound = InboundRequest::new(InboundBody::Empty).with_filename(bad);
            let err = translate(&catalog::CHART_FILE, &principal(), inbound, None).unwrap_err();
            assert_eq!(err, ProxyError::bad_request("Invalid filename"), "{bad:?}");
        }

        let inbound = InboundRequest::new(InboundBody::Empty).with_filename("q3 summary.png");
        let req = translate(&catalog::CHART_FILE, &principal(), inbound, None).unwrap();
        assert_eq!(req.segments(), &["reports", "charts", "q3 summary.png"]);
    }

    #[test]
    fn test_request_id_carried() {
        let inbound = InboundRequest::new(InboundBody::Empty).with_request_id("rid-1");
        let req = translate(&catalog::REWARDS, &principal(), inbound, None).unwrap();
        assert_eq!(req.request_id(), Some("rid-1"));
    }
}
