//! HS256 session-token verification.

use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::config::IdentityConfig;
use crate::identity::session::extract_session_token;
use crate::identity::{IdentityProvider, Principal};

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
}

/// Resolves principals from signed session tokens.
///
/// The `sub` claim is the user id. The verified token itself is what the
/// backend receives as its bearer credential.
pub struct JwtIdentityProvider {
    decoding_key: DecodingKey,
    validation: Validation,
    cookie_name: String,
}

impl JwtIdentityProvider {
    /// Build a provider from identity settings.
    pub fn new(config: &IdentityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_exp = true;
        validation.leeway = config.leeway_secs;

        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            cookie_name: config.session_cookie.clone(),
        }
    }

    fn verify(&self, token: &str) -> Option<Principal> {
        let data = match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "Session token rejected");
                return None;
            }
        };

        let user_id = data.claims.sub.trim();
        if user_id.is_empty() {
            tracing::debug!("Session token has empty subject");
            return None;
        }

        Some(Principal::new(user_id).with_session_token(token))
    }
}

impl IdentityProvider for JwtIdentityProvider {
    fn resolve(&self, headers: &HeaderMap) -> Option<Principal> {
        let token = extract_session_token(headers, &self.cookie_name)?;
        self.verify(&token)
    }

    fn bearer_token(&self, principal: &Principal) -> Option<String> {
        principal.session_token().map(str::to_string)
    }
}
