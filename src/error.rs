//! Error types.
//!
//! [`Error`] covers infrastructure failures: binding a port, opening the
//! store. [`ApiError`] covers everything a single request can fail with and
//! converts into the `{"message": ...}` envelope at the handler boundary.

use thiserror::Error;
use tracing::error;

use crate::post::ValidationError;
use crate::response::{IntoResponse, Response};
use crate::status::Status;
use crate::store::StoreError;

/// The error type returned by postbox's fallible startup and serving operations.
///
/// Request-level failures (404, 422, etc.) are expressed as HTTP responses
/// through [`ApiError`], not as `Error`s.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store: {0}")]
    Store(#[from] StoreError),
}

/// Failures local to one request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The client's `Accept` header excludes the produced media type.
    #[error("Request must accept {0} data")]
    NotAcceptable(&'static str),

    /// The request body is not declared as the required media type.
    #[error("Request must contain {0} data")]
    UnsupportedMediaType(&'static str),

    /// No post behind the id. Holds the id exactly as it appeared in the path.
    #[error("Could not find post with id {0}")]
    PostNotFound(String),

    #[error("Could not find resource at {0}")]
    RouteNotFound(String),

    #[error("Method {method} is not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error("Request body must be valid JSON")]
    MalformedBody,

    /// The transport failed before the body was fully received.
    #[error("Could not read request body")]
    UnreadableBody,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Store internals are logged, never serialised.
    #[error("Internal server error")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            Self::NotAcceptable(_)        => Status::NotAcceptable,
            Self::UnsupportedMediaType(_) => Status::UnsupportedMediaType,
            Self::PostNotFound(_)         => Status::NotFound,
            Self::RouteNotFound(_)        => Status::NotFound,
            Self::MethodNotAllowed { .. } => Status::MethodNotAllowed,
            Self::MalformedBody           => Status::BadRequest,
            Self::UnreadableBody          => Status::BadRequest,
            Self::Validation(_)           => Status::UnprocessableContent,
            Self::Store(_)                => Status::InternalServerError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Store(e) = &self {
            error!("store failure: {e}");
        }
        Response::message(self.status(), self.to_string())
    }
}
