//! HTTP status codes as a typed enum.
//!
//! Only the codes postbox actually answers with are listed. Every one of them
//! travels with a JSON body; see [`Response`](crate::Response).
//!
//! ```rust
//! use postbox::{Response, Status};
//!
//! Response::builder()
//!     .status(Status::Created)
//!     .header("location", "/api/posts/42")
//!     .json(&serde_json::json!({"id": 42}));
//! ```

/// The status codes produced by the posts API.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                   // 200
    Created,              // 201

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,           // 400
    NotFound,             // 404
    MethodNotAllowed,     // 405
    NotAcceptable,        // 406
    UnsupportedMediaType, // 415
    UnprocessableContent, // 422

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,  // 500
}

impl Status {
    /// Numeric code, e.g. `404`.
    pub fn code(self) -> u16 {
        match self {
            Self::Ok                   => 200,
            Self::Created              => 201,
            Self::BadRequest           => 400,
            Self::NotFound             => 404,
            Self::MethodNotAllowed     => 405,
            Self::NotAcceptable        => 406,
            Self::UnsupportedMediaType => 415,
            Self::UnprocessableContent => 422,
            Self::InternalServerError  => 500,
        }
    }
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> http::StatusCode {
        match s {
            Status::Ok                   => http::StatusCode::OK,
            Status::Created              => http::StatusCode::CREATED,
            Status::BadRequest           => http::StatusCode::BAD_REQUEST,
            Status::NotFound             => http::StatusCode::NOT_FOUND,
            Status::MethodNotAllowed     => http::StatusCode::METHOD_NOT_ALLOWED,
            Status::NotAcceptable        => http::StatusCode::NOT_ACCEPTABLE,
            Status::UnsupportedMediaType => http::StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Status::UnprocessableContent => http::StatusCode::UNPROCESSABLE_ENTITY,
            Status::InternalServerError  => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
