//! The post record, its create payload, and its wire projection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A stored post. `id` is assigned by the store and never changes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
}

/// Wire representation of a [`Post`], version 1: `{"id", "title", "body"}`.
///
/// Kept separate from [`Post`] so the storage row can change without
/// changing what clients see.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PostV1 {
    pub id: i64,
    pub title: String,
    pub body: String,
}

impl From<Post> for PostV1 {
    fn from(post: Post) -> Self {
        Self { id: post.id, title: post.title, body: post.body }
    }
}

/// A validated create payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub body: String,
}

/// First violation found in a create payload.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} is not of type 'object'")]
    NotAnObject(Value),

    #[error("'{0}' is a required property")]
    Missing(&'static str),

    #[error("{0} is not of type 'string'")]
    NotAString(Value),
}

impl NewPost {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { title: title.into(), body: body.into() }
    }

    /// Checks `value` against `{title: string, body: string}`, both required.
    ///
    /// Stops at the first violation, `title` before `body`. Extra properties
    /// are ignored.
    pub fn validate(value: &Value) -> Result<Self, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::NotAnObject(value.clone()))?;

        let title = string_field(object, "title")?;
        let body = string_field(object, "body")?;
        Ok(Self { title, body })
    }
}

fn string_field(
    object: &serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<String, ValidationError> {
    match object.get(name) {
        None => Err(ValidationError::Missing(name)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ValidationError::NotAString(other.clone())),
    }
}
