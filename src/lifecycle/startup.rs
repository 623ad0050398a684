//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the identity provider and forwarder from validated config
//! - Assemble the shared application state
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, GatewayConfig};
use crate::http::AppState;
use crate::identity::JwtIdentityProvider;
use crate::proxy::forward::{ForwarderError, HttpForwarder};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize backend forwarder: {0}")]
    Forwarder(#[from] ForwarderError),

    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(String),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build handler state from a validated configuration.
pub fn build_state(config: &GatewayConfig) -> Result<AppState, StartupError> {
    let identity = JwtIdentityProvider::new(&config.identity);
    let forwarder = HttpForwarder::new(&config.backend)?;

    tracing::info!(
        backend = config.backend.base_url.as_deref().unwrap_or_default(),
        documents = config.backend.documents_base().unwrap_or_default(),
        timeout_secs = config.backend.timeout_secs,
        "Backend forwarder ready"
    );

    Ok(AppState {
        identity: Arc::new(identity),
        forwarder: Arc::new(forwarder),
    })
}
