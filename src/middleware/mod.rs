//! Middleware layer.
//!
//! Middleware intercepts requests before they reach a handler and is the
//! right place for cross-cutting concerns. postbox models it as a [`Guard`]:
//! a synchronous check that either lets the request through or answers it
//! itself. Guards are attached to the [`Router`](crate::Router), either for
//! every route ([`Router::guard`](crate::Router::guard)) or for one
//! ([`Router::on_guarded`](crate::Router::on_guarded)).
//!
//! Built-in guards:
//! - [`Accept`]: content negotiation on the `Accept` header (406)
//! - [`RequireContentType`]: media type of the request body (415)
//!
//! Per-request tracing lives in the router's dispatch path, so every request
//! gets a span whether or not any guard is installed.

mod accept;
mod content_type;

pub use accept::{Accept, Negotiation};
pub use content_type::RequireContentType;

use crate::request::Request;
use crate::response::Response;

/// A pre-handler check.
///
/// `Ok(())` lets the request continue; `Err(response)` short-circuits and the
/// handler is never invoked.
pub trait Guard: Send + Sync + 'static {
    fn check(&self, req: &Request) -> Result<(), Response>;
}

/// Plain functions and closures work as guards.
impl<F> Guard for F
where
    F: Fn(&Request) -> Result<(), Response> + Send + Sync + 'static,
{
    fn check(&self, req: &Request) -> Result<(), Response> {
        self(req)
    }
}
