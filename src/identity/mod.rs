//! Identity subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound headers
//!     → session.rs (Authorization: Bearer / session cookie, fail closed)
//!     → jwt.rs (verify signature, exp, iss/aud; sub = user id)
//!     → Principal (explicit value handed to the proxy pipeline)
//! ```
//!
//! # Design Decisions
//! - One resolution contract: `IdentityProvider::resolve`
//! - Any ambiguity resolves to "no principal"
//! - The backend bearer credential is issued by the same provider

pub mod jwt;
pub mod principal;
pub mod session;

use axum::http::HeaderMap;

pub use jwt::JwtIdentityProvider;
pub use principal::Principal;

/// Resolves the caller of a request and issues backend credentials for it.
pub trait IdentityProvider: Send + Sync {
    /// Resolve the current principal from request headers.
    fn resolve(&self, headers: &HeaderMap) -> Option<Principal>;

    /// Bearer token to present to the backend on behalf of `principal`.
    fn bearer_token(&self, principal: &Principal) -> Option<String>;
}
