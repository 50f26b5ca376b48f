//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderMap;
use http::request::Parts;

/// An incoming HTTP request with its body already collected.
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) query: Vec<(String, String)>,
}

impl Request {
    pub(crate) fn new(parts: Parts, body: Bytes, params: HashMap<String, String>) -> Self {
        let query: Vec<(String, String)> = parts.uri.query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self { parts, body, params, query }
    }

    pub fn method(&self) -> &str { self.parts.method.as_str() }
    pub fn path(&self) -> &str { self.parts.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.parts.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Returns the first value that is valid
    /// visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get_all(name).iter()
            .find_map(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/api/posts/{id}`, `req.param("id")` on `/api/posts/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Decoded query-string pairs in the order they appeared.
    pub fn query_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.query.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
