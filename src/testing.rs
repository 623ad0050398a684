//! Test doubles shared by unit tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};

use crate::identity::{IdentityProvider, Principal};
use crate::proxy::forward::{BackendResponse, Forwarder, TransportError};
use crate::proxy::translate::ForwardedRequest;

/// Identity provider that ignores headers.
pub struct StaticIdentity {
    principal: Option<Principal>,
}

impl StaticIdentity {
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn user(user_id: &str) -> Self {
        Self {
            principal: Some(Principal::new(user_id).with_session_token("session-token")),
        }
    }

    /// A principal with no session token to hand to the backend.
    pub fn user_without_token(user_id: &str) -> Self {
        Self {
            principal: Some(Principal::new(user_id)),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn resolve(&self, _headers: &HeaderMap) -> Option<Principal> {
        self.principal.clone()
    }

    fn bearer_token(&self, principal: &Principal) -> Option<String> {
        principal.session_token().map(str::to_string)
    }
}

/// Forwarder that records every call and replays a fixed outcome.
pub struct RecordingForwarder {
    outcome: Result<BackendResponse, TransportError>,
    delay: Option<Duration>,
    calls: Mutex<Vec<ForwardedRequest>>,
}

impl RecordingForwarder {
    pub fn replying(response: BackendResponse) -> Self {
        Self {
            outcome: Ok(response),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn ok_json(value: serde_json::Value) -> Self {
        Self::replying(BackendResponse::json(StatusCode::OK, &value))
    }

    pub fn failing(err: TransportError) -> Self {
        Self {
            outcome: Err(err),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Hold every reply back by `delay`.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ForwardedRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Forwarder for RecordingForwarder {
    async fn forward(&self, request: ForwardedRequest) -> Result<BackendResponse, TransportError> {
        self.calls.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}
