//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require a backend location; there is no production default
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backend.base_url is required")]
    MissingBackendUrl,

    #[error("{field} is not an absolute http(s) URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("identity.jwt_secret must not be empty")]
    MissingJwtSecret,

    #[error("identity.jwt_secret is still a placeholder value")]
    PlaceholderJwtSecret,

    #[error("identity.session_cookie must not be empty")]
    EmptySessionCookie,

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("backend.timeout_secs ({backend}s) must be shorter than timeouts.request_secs ({request}s)")]
    BackendTimeoutTooLong { backend: u64, request: u64 },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Well-known sample values for `identity.jwt_secret`.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "changeme", "<session signing secret>"];

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.backend.base_url.as_deref() {
        None => errors.push(ValidationError::MissingBackendUrl),
        Some(raw) => check_url("backend.base_url", raw, &mut errors),
    }
    if let Some(raw) = config.backend.documents_url.as_deref() {
        check_url("backend.documents_url", raw, &mut errors);
    }

    let secret = config.identity.jwt_secret.trim();
    if secret.is_empty() {
        errors.push(ValidationError::MissingJwtSecret);
    } else if PLACEHOLDER_SECRETS.contains(&secret) {
        errors.push(ValidationError::PlaceholderJwtSecret);
    }
    if config.identity.session_cookie.is_empty() {
        errors.push(ValidationError::EmptySessionCookie);
    }

    if config.backend.timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("backend.timeout_secs"));
    }
    if config.backend.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("backend.connect_timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }
    if config.backend.timeout_secs >= config.timeouts.request_secs {
        errors.push(ValidationError::BackendTimeoutTooLong {
            backend: config.backend.timeout_secs,
            request: config.timeouts.request_secs,
        });
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue("security.max_body_size"));
    }

    check_addr("listener.bind_address", &config.listener.bind_address, &mut errors);
    if config.observability.metrics_enabled {
        check_addr(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, raw: &str, errors: &mut Vec<ValidationError>) {
    let ok = Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host() && !u.cannot_be_a_base())
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: raw.to_string(),
        });
    }
}

fn check_addr(field: &'static str, raw: &str, errors: &mut Vec<ValidationError>) {
    if raw.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: raw.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.backend.base_url = Some("http://127.0.0.1:8000".into());
        config.identity.jwt_secret = "secret".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_missing_base_url_fails() {
        let mut config = valid();
        config.backend.base_url = None;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingBackendUrl]);
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = valid();
        config.backend.base_url = Some("not a url".into());
        config.backend.documents_url = Some("ftp://files".into());
        config.identity.jwt_secret.clear();
        config.backend.timeout_secs = 0;
        config.listener.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.contains(&ValidationError::MissingJwtSecret));
        assert!(errors.contains(&ValidationError::ZeroValue("backend.timeout_secs")));
    }

    #[test]
    fn test_placeholder_secret_fails() {
        let mut config = valid();
        config.identity.jwt_secret = " change-me ".into();
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::PlaceholderJwtSecret]
        );
    }

    #[test]
    fn test_equal_timeouts_rejected() {
        let mut config = valid();
        config.backend.timeout_secs = 60;
        config.timeouts.request_secs = 60;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::BackendTimeoutTooLong {
                backend: 60,
                request: 60
            }]
        );
    }

    #[test]
    fn test_backend_timeout_bounded_by_request_timeout() {
        let mut config = valid();
        config.backend.timeout_secs = 90;
        config.timeouts.request_secs = 60;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::BackendTimeoutTooLong {
                backend: 90,
                request: 60
            }]
        );
    }
}
