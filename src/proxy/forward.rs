//! Outbound calls to the backend.
//!
//! # Responsibilities
//! - Resolve the backend base URL per service
//! - Encode path segments, query pairs and bodies
//! - Propagate the bearer credential and request ID
//!
//! # Design Decisions
//! - Exactly one attempt per inbound request; retries are the backend's concern
//! - Every call has a deadline; expiry is reported as `TransportError::Timeout`
//! - Dropping the returned future aborts the call

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, StatusCode};
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;
use crate::http::request::X_REQUEST_ID;
use crate::proxy::route::Service;
use crate::proxy::translate::{FormPart, ForwardedRequest, OutboundBody};

/// Raw backend reply, consumed once by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl BackendResponse {
    pub fn new(status: StatusCode, content_type: Option<&str>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// A JSON reply.
    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status, Some("application/json"), value.to_string())
    }
}

/// Failure to obtain any backend reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection to backend failed: {0}")]
    Connect(String),

    #[error("failed to read backend response: {0}")]
    Body(String),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("backend request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout(_) => "timeout",
            TransportError::Connect(_) => "connect",
            TransportError::Body(_) => "body",
            TransportError::InvalidUrl(_) => "invalid_url",
            TransportError::Request(_) => "request",
        }
    }
}

/// Issues the single outbound call for a translated request.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, request: ForwardedRequest) -> Result<BackendResponse, TransportError>;
}

/// Error building the HTTP forwarder from configuration.
#[derive(Debug, Error)]
pub enum ForwarderError {
    #[error("backend.base_url is not configured")]
    MissingBaseUrl,

    #[error("invalid backend URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// `Forwarder` backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
    expense_base: Url,
    documents_base: Url,
    timeout: Duration,
}

impl HttpForwarder {
    /// Build a forwarder from backend settings.
    pub fn new(config: &BackendConfig) -> Result<Self, ForwarderError> {
        let expense = config.base_url.as_deref().ok_or(ForwarderError::MissingBaseUrl)?;
        let documents = config.documents_base().ok_or(ForwarderError::MissingBaseUrl)?;
        let timeout = Duration::from_secs(config.timeout_secs);

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            expense_base: parse_base(expense)?,
            documents_base: parse_base(documents)?,
            timeout,
        })
    }

    fn base(&self, service: Service) -> &Url {
        match service {
            Service::Expense => &self.expense_base,
            Service::Documents => &self.documents_base,
        }
    }

    /// Full backend URL for a request.
    pub fn url_for(&self, request: &ForwardedRequest) -> Result<Url, TransportError> {
        let mut url = self.base(request.service()).clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| TransportError::InvalidUrl("base URL cannot have a path".into()))?;
            segments.pop_if_empty();
            segments.extend(request.segments());
        }
        if !request.query().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query());
        }
        Ok(url)
    }

    fn classify(&self, err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

fn parse_base(raw: &str) -> Result<Url, ForwarderError> {
    Url::parse(raw).map_err(|source| ForwarderError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

fn build_form(parts: Vec<FormPart>) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for p in parts {
        match p.file_name {
            Some(file_name) => {
                let mut part = Part::bytes(p.data.to_vec()).file_name(file_name);
                if let Some(ct) = p.content_type.as_deref() {
                    part = part
                        .mime_str(ct)
                        .map_err(|e| TransportError::Request(format!("invalid part content type: {e}")))?;
                }
                form = form.part(p.name, part);
            }
            None => {
                let text = String::from_utf8_lossy(&p.data).into_owned();
                form = form.text(p.name, text);
            }
        }
    }
    Ok(form)
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, request: ForwardedRequest) -> Result<BackendResponse, TransportError> {
        let url = self.url_for(&request)?;
        let mut builder = self.client.request(request.method().as_method(), url);

        if let Some(token) = request.bearer() {
            builder = builder.bearer_auth(token);
        }
        if let Some(id) = request.request_id() {
            builder = builder.header(X_REQUEST_ID, id);
        }
        builder = match request.into_body() {
            OutboundBody::Empty => builder,
            OutboundBody::Json(value) => builder.json(&value),
            OutboundBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let response = builder.send().await.map_err(|e| self.classify(&e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| self.classify(&e))?;

        Ok(BackendResponse {
            status,
            content_type,
            body,
        })
    }
}
