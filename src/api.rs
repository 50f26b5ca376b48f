//! The posts resource: routes and handlers.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/api/posts` | [`list_posts`] |
//! | POST | `/api/posts` | [`create_post`] |
//! | GET | `/api/posts/{id}` | [`get_post`] |
//! | DELETE | `/api/posts/{id}` | [`delete_post`] |
//!
//! Content negotiation is installed once, router-wide, so every route gets
//! the same policy.

use std::sync::Arc;

use tracing::info;

use crate::error::ApiError;
use crate::filter::PostFilter;
use crate::method::Method;
use crate::middleware::{Accept, Negotiation, RequireContentType};
use crate::post::{NewPost, PostV1};
use crate::request::Request;
use crate::response::{Json, Response};
use crate::router::Router;
use crate::status::Status;
use crate::store::{PostStore, StoreError};

/// Shared handle to the record store, cloned into each handler call.
pub type Store = Arc<dyn PostStore>;

pub const POSTS_PATH: &str = "/api/posts";
pub const POST_PATH: &str = "/api/posts/{id}";

/// Builds the posts router on top of `store`.
pub fn router(store: Store, negotiation: Negotiation) -> Router<Store> {
    Router::new(store)
        .guard(Accept::json(negotiation))
        .on(Method::Get, POSTS_PATH, list_posts)
        .on_guarded(Method::Post, POSTS_PATH, RequireContentType::json(), create_post)
        .on(Method::Get, POST_PATH, get_post)
        .on(Method::Delete, POST_PATH, delete_post)
}

/// Runs a store operation on the blocking pool.
async fn blocking<T, F>(store: &Store, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn PostStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    let out = tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))??;
    Ok(out)
}

/// The `{id}` path segment, raw and parsed. Segments that are not integers
/// cannot name a post, so they parse to `None`.
fn post_id(req: &Request) -> (String, Option<i64>) {
    let raw = req.param("id").unwrap_or_default().to_owned();
    let id = raw.parse().ok();
    (raw, id)
}

/// GET /api/posts: every post matching the query filters, by ascending id.
pub async fn list_posts(req: Request, store: Store) -> Result<Json<Vec<PostV1>>, ApiError> {
    let filter = PostFilter::from_query(req.query_pairs());
    let posts = blocking(&store, move |s| s.list(&filter)).await?;
    Ok(Json(posts.into_iter().map(PostV1::from).collect()))
}

/// GET /api/posts/{id}
pub async fn get_post(req: Request, store: Store) -> Result<Json<PostV1>, ApiError> {
    let (raw, id) = post_id(&req);
    let Some(id) = id else {
        return Err(ApiError::PostNotFound(raw));
    };

    match blocking(&store, move |s| s.get(id)).await? {
        Some(post) => Ok(Json(PostV1::from(post))),
        None => Err(ApiError::PostNotFound(raw)),
    }
}

/// DELETE /api/posts/{id}: answers with the post as it was before deletion.
pub async fn delete_post(req: Request, store: Store) -> Result<Json<PostV1>, ApiError> {
    let (raw, id) = post_id(&req);
    let Some(id) = id else {
        return Err(ApiError::PostNotFound(raw));
    };

    match blocking(&store, move |s| s.delete(id)).await? {
        Some(post) => {
            info!(id = post.id, "post deleted");
            Ok(Json(PostV1::from(post)))
        }
        None => Err(ApiError::PostNotFound(raw)),
    }
}

/// POST /api/posts: 201 with a `Location` header and the stored post.
pub async fn create_post(req: Request, store: Store) -> Result<Response, ApiError> {
    let payload: serde_json::Value =
        serde_json::from_slice(req.body()).map_err(|_| ApiError::MalformedBody)?;
    let new = NewPost::validate(&payload)?;

    let post = blocking(&store, move |s| s.insert(&new)).await?;
    info!(id = post.id, "post created");

    let location = format!("{POSTS_PATH}/{}", post.id);
    Ok(Response::builder()
        .status(Status::Created)
        .header("location", &location)
        .json(&PostV1::from(post)))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde_json::{Value, json};

    use super::*;
    use crate::response::Message;
    use crate::store::MemoryStore;

    fn app() -> (Router<Store>, Store) {
        let store: Store = Arc::new(MemoryStore::new());
        (router(Arc::clone(&store), Negotiation::Enforced), store)
    }

    fn get(uri: &str) -> http::Request<Bytes> {
        http::Request::builder()
            .uri(uri)
            .header("Accept", "application/json")
            .body(Bytes::new())
            .unwrap()
    }

    fn body(res: &Response) -> Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    #[tokio::test]
    async fn list_maps_every_post_through_the_projection() {
        let (app, store) = app();
        store.insert(&NewPost::new("Example A", "Body A")).unwrap();
        store.insert(&NewPost::new("Example B", "Body B")).unwrap();

        let res = app.call(get("/api/posts")).await;
        assert_eq!(res.status(), Status::Ok);
        assert_eq!(
            body(&res),
            json!([
                {"id": 1, "title": "Example A", "body": "Body A"},
                {"id": 2, "title": "Example B", "body": "Body B"},
            ])
        );
    }

    #[tokio::test]
    async fn non_numeric_id_is_not_found_with_literal_text() {
        let (app, _) = app();
        let res = app.call(get("/api/posts/abc")).await;
        assert_eq!(res.status(), Status::NotFound);
        let msg: Message = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(msg.message, "Could not find post with id abc");
    }

    #[tokio::test]
    async fn delete_returns_snapshot_and_removes() {
        let (app, store) = app();
        let post = store.insert(&NewPost::new("Doomed", "Soon gone")).unwrap();

        let req = http::Request::builder()
            .method("DELETE")
            .uri(format!("/api/posts/{}", post.id))
            .body(Bytes::new())
            .unwrap();
        let res = app.call(req).await;
        assert_eq!(res.status(), Status::Ok);
        assert_eq!(body(&res), json!({"id": 1, "title": "Doomed", "body": "Soon gone"}));
        assert_eq!(store.get(post.id).unwrap(), None);
    }

    #[tokio::test]
    async fn create_sets_location() {
        let (app, _) = app();
        let req = http::Request::builder()
            .method("POST")
            .uri("/api/posts")
            .header("Content-Type", "application/json")
            .body(Bytes::from_static(br#"{"title": "New", "body": "Post"}"#))
            .unwrap();

        let res = app.call(req).await;
        assert_eq!(res.status(), Status::Created);
        assert_eq!(res.header("location"), Some("/api/posts/1"));
        assert_eq!(body(&res), json!({"id": 1, "title": "New", "body": "Post"}));
    }

    #[tokio::test]
    async fn create_rejects_malformed_json() {
        let (app, store) = app();
        let req = http::Request::builder()
            .method("POST")
            .uri("/api/posts")
            .header("Content-Type", "application/json")
            .body(Bytes::from_static(b"{not json"))
            .unwrap();

        let res = app.call(req).await;
        assert_eq!(res.status(), Status::BadRequest);
        assert_eq!(body(&res), json!({"message": "Request body must be valid JSON"}));
        assert!(store.list(&PostFilter::default()).unwrap().is_empty());
    }
}
