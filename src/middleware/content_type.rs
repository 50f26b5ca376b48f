//! Media-type requirement on request bodies.

use tracing::debug;

use crate::error::ApiError;
use crate::middleware::Guard;
use crate::request::Request;
use crate::response::{APPLICATION_JSON, IntoResponse, Response};

/// Guard that rejects requests whose `Content-Type` is not `mime` (415).
///
/// Parameters such as `charset` are ignored. A missing header is rejected.
#[derive(Clone, Debug)]
pub struct RequireContentType {
    mime: &'static str,
}

impl RequireContentType {
    pub fn new(mime: &'static str) -> Self {
        Self { mime }
    }

    pub fn json() -> Self {
        Self::new(APPLICATION_JSON)
    }
}

impl Guard for RequireContentType {
    fn check(&self, req: &Request) -> Result<(), Response> {
        let declared = req.header("content-type")
            .and_then(|v| v.split(';').next())
            .map(str::trim)
            .unwrap_or("");

        if declared.eq_ignore_ascii_case(self.mime) {
            return Ok(());
        }

        debug!(content_type = %declared, "rejecting request: unsupported media type");
        Err(ApiError::UnsupportedMediaType(self.mime).into_response())
    }
}
