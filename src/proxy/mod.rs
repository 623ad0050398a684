//! Proxy pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (route known from the router)
//!     → gate.rs (IdentityProvider → Principal, else 401)
//!     → translate.rs (validate, coerce, inject identity → ForwardedRequest)
//!     → forward.rs (one backend call → BackendResponse | TransportError)
//!     → normalize.rs (reshape success, re-wrap failures → Reply | ProxyError)
//! ```
//!
//! # Design Decisions
//! - Routes are data (`catalog.rs`), the pipeline is shared code
//! - Every outcome is a tagged `Result`; nothing is signalled by panics
//! - The principal is an explicit argument at every stage

pub mod catalog;
pub mod error;
pub mod forward;
pub mod gate;
pub mod normalize;
pub mod pipeline;
pub mod route;
pub mod translate;

pub use catalog::ROUTES;
pub use error::ProxyError;
pub use forward::{BackendResponse, Forwarder, HttpForwarder, TransportError};
pub use gate::authenticate;
pub use normalize::{error_response, Reply};
pub use pipeline::execute;
pub use route::RouteSpec;
pub use translate::{InboundBody, InboundRequest};
