//! Lumen API gateway library.
//!
//! Authenticates browser requests, translates them for the expense and
//! document backends, forwards exactly one call each, and normalizes the
//! reply.

// Core subsystems
pub mod config;
pub mod http;
pub mod identity;
pub mod proxy;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

#[cfg(test)]
mod testing;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
