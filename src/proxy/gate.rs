//! Request gate: no principal, no backend call.

use axum::http::HeaderMap;

use crate::identity::{IdentityProvider, Principal};
use crate::proxy::error::ProxyError;

/// Resolve the caller or fail with `Unauthorized`.
///
/// Runs before the body is read, so an unauthenticated upload is rejected
/// without buffering it.
pub fn authenticate(provider: &dyn IdentityProvider, headers: &HeaderMap) -> Result<Principal, ProxyError> {
    provider.resolve(headers).ok_or(ProxyError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticIdentity;

    #[test]
    fn test_authenticate() {
        let headers = HeaderMap::new();

        let err = authenticate(&StaticIdentity::anonymous(), &headers).unwrap_err();
        assert_eq!(err, ProxyError::Unauthorized);

        let principal = authenticate(&StaticIdentity::user("user_1"), &headers).unwrap();
        assert_eq!(principal.user_id(), "user_1");
    }
}
