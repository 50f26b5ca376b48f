//! Content negotiation on the `Accept` header.
//!
//! The service produces exactly one media type. A request whose `Accept`
//! header rules that type out is answered with 406 before routing.
//!
//! | `Accept` | `application/json` acceptable? |
//! |---|---|
//! | absent or blank | yes |
//! | `application/json` | yes |
//! | `application/*`, `*/*`, `*` | yes |
//! | `application/json;q=0` | no |
//! | `application/xml` | no |

use clap::ValueEnum;
use tracing::debug;

use crate::error::ApiError;
use crate::middleware::Guard;
use crate::request::Request;
use crate::response::{APPLICATION_JSON, IntoResponse, Response};

/// Whether the `Accept` header is checked at all.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum Negotiation {
    /// Requests that do not accept the produced type get 406.
    #[default]
    Enforced,
    /// Every request passes.
    Unenforced,
}

/// Guard that rejects requests which cannot accept `mime`.
#[derive(Clone, Debug)]
pub struct Accept {
    mime: &'static str,
    mode: Negotiation,
}

impl Accept {
    pub fn new(mime: &'static str, mode: Negotiation) -> Self {
        Self { mime, mode }
    }

    /// Negotiates for `application/json`.
    pub fn json(mode: Negotiation) -> Self {
        Self::new(APPLICATION_JSON, mode)
    }
}

impl Guard for Accept {
    fn check(&self, req: &Request) -> Result<(), Response> {
        if self.mode == Negotiation::Unenforced {
            return Ok(());
        }

        // Repeated header lines form one comma-separated list.
        let values: Vec<&str> = req.headers()
            .get_all(http::header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        let header = values.join(",");

        if header.trim().is_empty() || accepts(&header, self.mime) {
            return Ok(());
        }

        debug!(accept = %header, "rejecting request: not acceptable");
        Err(ApiError::NotAcceptable(self.mime).into_response())
    }
}

/// True if the `Accept` field value `header` admits `mime` with `q > 0`.
pub(crate) fn accepts(header: &str, mime: &str) -> bool {
    let (kind, _) = mime.split_once('/').unwrap_or((mime, ""));

    header.split(',').any(|range| {
        let mut parts = range.split(';');
        let media = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        if media.is_empty() || quality(parts) <= 0.0 {
            return false;
        }
        match media.split_once('/') {
            Some(("*", "*")) => true,
            Some((k, "*")) => k.eq_ignore_ascii_case(kind),
            Some(_) => media.eq_ignore_ascii_case(mime),
            None => media == "*",
        }
    })
}

/// The `q` parameter of a media range. Missing or unparsable means 1; a
/// number outside `0..=1` (including `nan` and `inf`) means 0.
fn quality<'a>(params: impl Iterator<Item = &'a str>) -> f32 {
    params
        .filter_map(|p| p.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("q"))
        .and_then(|(_, v)| v.trim().parse::<f32>().ok())
        .map_or(1.0, |q| if (0.0..=1.0).contains(&q) { q } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;

    use super::*;
    use crate::response::Message;
    use crate::status::Status;

    fn request(accept: &[&str]) -> Request {
        let mut builder = http::Request::builder().uri("/api/posts");
        for value in accept {
            builder = builder.header("Accept", *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        Request::new(parts, Bytes::new(), HashMap::new())
    }

    #[test]
    fn accepts_exact_and_wildcards() {
        for header in [
            "application/json",
            "Application/JSON",
            "text/html, application/json;q=0.9",
            "application/*",
            "*/*",
            "*",
            "text/html;level=1, */*;q=0.1",
        ] {
            assert!(accepts(header, APPLICATION_JSON), "{header}");
        }
    }

    #[test]
    fn rejects_other_types_and_zero_quality() {
        for header in [
            "application/xml",
            "text/*",
            "application/json;q=0",
            "application/json; q=0.0, text/html",
            "application/jsonp",
        ] {
            assert!(!accepts(header, APPLICATION_JSON), "{header}");
        }
    }

    #[test]
    fn unparsable_quality_counts_as_one() {
        assert!(accepts("application/json;q=high", APPLICATION_JSON));
    }

    #[test]
    fn out_of_range_quality_rejects() {
        for header in ["application/json;q=nan", "application/json;q=inf", "application/json;q=-1", "*/*;q=2"] {
            assert!(!accepts(header, APPLICATION_JSON), "{header}");
        }
    }

    #[test]
    fn missing_or_blank_header_accepts_anything() {
        let guard = Accept::json(Negotiation::Enforced);
        assert!(guard.check(&request(&[])).is_ok());
        assert!(guard.check(&request(&[" "])).is_ok());
    }

    #[test]
    fn repeated_header_lines_are_combined() {
        let guard = Accept::json(Negotiation::Enforced);
        assert!(guard.check(&request(&["application/xml", "application/json"])).is_ok());
    }

    #[test]
    fn enforced_rejection_uses_message_envelope() {
        let guard = Accept::json(Negotiation::Enforced);
        let res = guard.check(&request(&["application/xml"])).unwrap_err();
        assert_eq!(res.status(), Status::NotAcceptable);
        let msg: Message = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(msg.message, "Request must accept application/json data");
    }

    #[test]
    fn unenforced_lets_everything_through() {
        let guard = Accept::json(Negotiation::Unenforced);
        assert!(guard.check(&request(&["application/xml"])).is_ok());
    }
}
