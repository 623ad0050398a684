//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber before anything else runs
//! - Derive the filter from the configured log level once config is loaded
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level
//! - The filter sits behind a reload layer so config loading is itself logged

use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, util::TryInitError, EnvFilter,
    Registry,
};

use crate::config::ObservabilityConfig;

/// Level used until the configuration has been read.
pub const BOOTSTRAP_LEVEL: &str = "info";

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(level: &str) -> String {
    format!("lumen_gateway={level},tower_http={level}")
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Handle to the installed subscriber's filter.
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    /// Switch to the level named in `config`.
    pub fn apply(&self, config: &ObservabilityConfig) -> Result<(), reload::Error> {
        self.filter.reload(filter_for(&config.log_level))
    }
}

/// Install the global subscriber at `level`. Fails if one is already installed.
pub fn init_logging(level: &str) -> Result<LogHandle, TryInitError> {
    let (filter, handle) = reload::Layer::new(filter_for(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(LogHandle { filter: handle })
}
