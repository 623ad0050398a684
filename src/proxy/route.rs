//! Declarative description of one proxied route.
//!
//! Every browser-facing route is a `RouteSpec` value. The pipeline reads that
//! value; it never contains per-route code.

use axum::http::Method;

/// HTTP verb used on either side of the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    pub fn as_method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
        }
    }
}

/// Which backend deployment serves a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Expense tracking, settings, rewards and AI analysis.
    Expense,
    /// Document processing and generated reports.
    Documents,
}

/// Shape of the payload the browser sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundKind {
    /// No payload is read.
    Empty,
    /// A JSON object body. An empty body counts as `{}`.
    Json,
    /// A `multipart/form-data` upload.
    Multipart,
    /// URL query parameters.
    Query,
}

/// How a declared field is validated and coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string.
    Text,
    /// A number, or a string that parses as one.
    Number,
    /// Any JSON value, forwarded as is.
    Any,
    /// An uploaded file part.
    File,
}

/// Rule for one inbound field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Value used when an optional text field is absent.
    pub default: Option<&'static str>,
    /// Name expected by the backend, if different.
    pub rename: Option<&'static str>,
}

impl FieldRule {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
            rename: None,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            rename: None,
        }
    }

    pub const fn with_default(self, default: &'static str) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    pub const fn renamed(self, backend_name: &'static str) -> Self {
        Self {
            rename: Some(backend_name),
            ..self
        }
    }

    /// Field name on the backend side.
    pub fn backend_name(&self) -> &'static str {
        self.rename.unwrap_or(self.name)
    }
}

/// Where the principal id is injected into the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPlacement {
    /// A field of the outbound JSON body.
    BodyField(&'static str),
    /// A text part of the outbound multipart form.
    FormField(&'static str),
    /// An outbound query parameter.
    QueryParam(&'static str),
    /// The `{user_id}` placeholder in the backend path.
    PathSegment,
    /// The caller must be authenticated but the id is not sent.
    GateOnly,
}

/// How a successful JSON payload is reshaped for the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonShape {
    /// `(backend field, client field)` pairs.
    pub renames: &'static [(&'static str, &'static str)],
    /// Fields that must be arrays; missing or null becomes `[]`.
    pub ensure_arrays: &'static [&'static str],
    /// When set, only these client fields are kept.
    pub select: Option<&'static [&'static str]>,
}

impl JsonShape {
    pub const PASSTHROUGH: JsonShape = JsonShape {
        renames: &[],
        ensure_arrays: &[],
        select: None,
    };
}

/// `Content-Disposition` type for binary passthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Attachment,
    Inline,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Attachment => "attachment",
            Disposition::Inline => "inline",
        }
    }
}

/// How a successful binary payload is re-emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryShape {
    /// Used when the backend sends no content type.
    pub default_content_type: &'static str,
    pub disposition: Disposition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Json(JsonShape),
    Binary(BinaryShape),
}

/// Route-local error contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorShape {
    /// Prefix of every upstream failure message, e.g. "Failed to fetch reports".
    pub message: &'static str,
    /// Keys added as empty arrays to JSON error bodies.
    pub fallback_arrays: &'static [&'static str],
    /// Message for a backend 404, which then surfaces as 404.
    pub not_found: Option<&'static str>,
}

impl ErrorShape {
    pub const fn message(message: &'static str) -> Self {
        Self {
            message,
            fallback_arrays: &[],
            not_found: None,
        }
    }
}

/// Complete description of one proxied route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    /// Identifier for logs and metrics.
    pub name: &'static str,
    /// Browser-facing path in router syntax, e.g. `/api/reports/{filename}`.
    pub path: &'static str,
    pub method: Verb,
    pub service: Service,
    pub backend_method: Verb,
    /// Backend path; may contain `{user_id}` and `{filename}`.
    pub backend_path: &'static str,
    pub inbound: InboundKind,
    pub fields: &'static [FieldRule],
    pub identity: IdentityPlacement,
    /// Nest the whole inbound JSON object under this backend field.
    pub wrap_body: Option<&'static str>,
    /// Send `Authorization: Bearer` to the backend.
    pub bearer: bool,
    pub response: ResponseShape,
    pub error: ErrorShape,
}

impl RouteSpec {
    /// Whether the browser path carries a `{filename}` parameter.
    pub fn takes_filename(&self) -> bool {
        self.path.contains("{filename}")
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.response, ResponseShape::Binary(_))
    }
}
