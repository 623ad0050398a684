//! The authenticated caller of one request.

use std::fmt;

/// Identity resolved for a single inbound request.
///
/// Constructed only by an [`IdentityProvider`](super::IdentityProvider) or by
/// tests; the proxy pipeline takes it as an explicit argument and never reads
/// identity from ambient state.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: String,
    session_token: Option<String>,
}

impl Principal {
    /// Create a principal without an attached session token.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_token: None,
        }
    }

    /// Attach the session token this principal was resolved from.
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Opaque user identifier understood by the backend.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Raw session token, if the principal came from one.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

// Tokens are credentials; keep them out of logs.
impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("user_id", &self.user_id)
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_id)
    }
}
