//! One pass through translate → forward → normalize for an authenticated caller.

use crate::identity::{IdentityProvider, Principal};
use crate::observability::metrics;
use crate::proxy::error::ProxyError;
use crate::proxy::forward::Forwarder;
use crate::proxy::normalize::{normalize, Reply};
use crate::proxy::route::RouteSpec;
use crate::proxy::translate::{translate, InboundRequest};

/// Run `route` for `principal`.
///
/// Validation failures return before the forwarder is touched; otherwise
/// exactly one backend call is made.
pub async fn execute(
    route: &RouteSpec,
    principal: &Principal,
    inbound: InboundRequest,
    identity: &dyn IdentityProvider,
    forwarder: &dyn Forwarder,
) -> Result<Reply, ProxyError> {
    let bearer = if route.bearer {
        match identity.bearer_token(principal) {
            Some(token) => Some(token),
            None => {
                tracing::warn!(route = route.name, user_id = %principal, "No backend credential for principal");
                return Err(ProxyError::Unauthorized);
            }
        }
    } else {
        None
    };

    let filename = inbound.filename.clone();
    let request = translate(route, principal, inbound, bearer)?;

    tracing::debug!(
        route = route.name,
        request_id = request.request_id().unwrap_or("-"),
        user_id = %principal,
        backend_path = %request.path(),
        "Forwarding request"
    );

    let outcome = forwarder.forward(request).await;
    if let Err(e) = &outcome {
        metrics::record_upstream_failure(route.name, e.kind());
    }

    normalize(route, filename.as_deref(), outcome)
}
