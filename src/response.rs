//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Every response postbox sends is JSON. Success bodies are whatever the
//! handler serialises; failure bodies are always a [`Message`] envelope,
//! `{"message": "..."}`, and nothing else.

use bytes::Bytes;
use http_body_util::Full;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::status::Status;

/// The only media type postbox produces.
pub const APPLICATION_JSON: &str = "application/json";

const INTERNAL_ERROR_BODY: &[u8] = br#"{"message":"Internal server error"}"#;

// ── Message ───────────────────────────────────────────────────────────────────

/// The error envelope. Exactly one field.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts
///
/// ```rust
/// use postbox::{Response, Status};
///
/// Response::json(&serde_json::json!({"id": 1}));
/// Response::message(Status::NotFound, "Could not find post with id 1");
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use postbox::{Response, Status};
///
/// Response::builder()
///     .status(Status::Created)
///     .header("location", "/api/posts/42")
///     .json(&serde_json::json!({"id": 42}));
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Bytes,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: Status,
}

impl Response {
    /// `200 OK` with `value` serialised as the body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        Self::builder().json(value)
    }

    /// Error envelope `{"message": ...}` with the given status.
    pub fn message(status: Status, message: impl Into<String>) -> Self {
        Self::builder().status(status).json(&Message::new(message))
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok }
    }

    pub fn status(&self) -> Status { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn internal_error() -> Self {
        Self {
            body: Bytes::from_static(INTERNAL_ERROR_BODY),
            headers: vec![("content-type".to_owned(), APPLICATION_JSON.to_owned())],
            status: Status::InternalServerError,
        }
    }

    /// Converts into the hyper response type.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(http::StatusCode::from(self.status));
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match builder.body(Full::new(self.body)) {
            Ok(res) => res,
            Err(e) => {
                error!("invalid response header: {e}");
                let mut res = http::Response::new(Full::new(Bytes::from_static(INTERNAL_ERROR_BODY)));
                *res.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                res.headers_mut().insert(
                    http::header::CONTENT_TYPE,
                    http::HeaderValue::from_static(APPLICATION_JSON),
                );
                res
            }
        }
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
/// Terminated by [`json`](ResponseBuilder::json); there is no other body kind.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: Status,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    ///
    /// A value that fails to serialise turns the whole response into a 500
    /// carrying the generic error envelope.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Response {
        match serde_json::to_vec(value) {
            Ok(body) => {
                let mut headers = vec![("content-type".to_owned(), APPLICATION_JSON.to_owned())];
                headers.extend(self.headers);
                Response { body: Bytes::from(body), headers, status: self.status }
            }
            Err(e) => {
                error!("response serialisation failed: {e}");
                Response::internal_error()
            }
        }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Handlers return anything implementing this: a [`Response`], a [`Json`]
/// payload, an [`ApiError`](crate::ApiError), or a `Result` of those.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

/// `200 OK` with a serialised payload.
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response { Response::json(&self.0) }
}

impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: IntoResponse,
{
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}
