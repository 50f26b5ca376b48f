//! # postbox
//!
//! A small JSON resource service for one collection of posts.
//!
//! ## The contract
//!
//! Every response is `application/json`. Successes carry a post or an array
//! of posts; failures carry exactly `{"message": "..."}`.
//!
//! | Method | Path | Success | Failure |
//! |---|---|---|---|
//! | GET | `/api/posts?title_like=&body_like=` | 200, array | 406 |
//! | POST | `/api/posts` | 201, post + `Location` | 400, 406, 415, 422 |
//! | GET | `/api/posts/{id}` | 200, post | 404, 406 |
//! | DELETE | `/api/posts/{id}` | 200, deleted post | 404, 406 |
//!
//! ## Layers
//!
//! - Radix-tree routing via [`matchit`], with [`middleware`] guards applied
//!   at dispatch time
//! - Async I/O via tokio and hyper, HTTP/1.1 and HTTP/2
//! - Record stores behind [`PostStore`]: SQLite through rusqlite, or in memory
//! - Graceful shutdown on SIGTERM / Ctrl-C
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use postbox::middleware::Negotiation;
//! use postbox::{Server, SqliteStore, api};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), postbox::Error> {
//!     let store = Arc::new(SqliteStore::open("posts.db")?);
//!     let app = api::router(store, Negotiation::Enforced);
//!
//!     Server::bind("0.0.0.0:8080".parse().unwrap()).serve(app).await
//! }
//! ```

mod error;
mod filter;
mod handler;
mod method;
mod post;
mod request;
mod response;
mod router;
mod server;
mod status;
mod store;

pub mod api;
pub mod config;
pub mod middleware;

pub use error::{ApiError, Error};
pub use filter::{Clause, Field, PostFilter};
pub use handler::Handler;
pub use method::Method;
pub use post::{NewPost, Post, PostV1, ValidationError};
pub use request::Request;
pub use response::{APPLICATION_JSON, IntoResponse, Json, Message, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
pub use store::{MemoryStore, PostStore, SqliteStore, StoreError};
