//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Guards run in a fixed
//! order: router-wide guards first (before the route is even resolved), then
//! the matched route's own guards, then the handler.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use matchit::Router as MatchitRouter;
use tracing::{Instrument, info, info_span};

use crate::error::ApiError;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::Guard;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

type BoxedGuard = Arc<dyn Guard>;

struct Route<S> {
    handler: BoxedHandler<S>,
    guards: Vec<BoxedGuard>,
}

/// The application router.
///
/// Holds the shared state `S` handed to every handler, the router-wide
/// guards, and one radix tree per method. Build it once at startup; pass it
/// to [`Server::serve`](crate::Server::serve). Registration methods return
/// `self` so they chain.
pub struct Router<S> {
    routes: HashMap<Method, MatchitRouter<Route<S>>>,
    guards: Vec<BoxedGuard>,
    state: S,
}

impl<S> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(state: S) -> Self {
        Self { routes: HashMap::new(), guards: Vec::new(), state }
    }

    /// Installs a guard that runs for every request, before routing.
    pub fn guard(mut self, guard: impl Guard) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use postbox::{Method, Request, Response, Router};
    /// # async fn get_post(_: Request, _: ()) -> Response { Response::json(&()) }
    /// # async fn list_posts(_: Request, _: ()) -> Response { Response::json(&()) }
    /// Router::new(())
    ///     .on(Method::Get, "/api/posts/{id}", get_post)
    ///     .on(Method::Get, "/api/posts",      list_posts);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup.
    pub fn on(self, method: Method, path: &str, handler: impl Handler<S>) -> Self {
        self.add(method, path, Vec::new(), handler)
    }

    /// Like [`on`](Router::on), with a guard that runs only for this route.
    pub fn on_guarded(
        self,
        method: Method,
        path: &str,
        guard: impl Guard,
        handler: impl Handler<S>,
    ) -> Self {
        self.add(method, path, vec![Arc::new(guard)], handler)
    }

    fn add(
        mut self,
        method: Method,
        path: &str,
        guards: Vec<BoxedGuard>,
        handler: impl Handler<S>,
    ) -> Self {
        let route = Route { handler: handler.into_boxed_handler(), guards };
        self.routes
            .entry(method)
            .or_default()
            .insert(path, route)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Routes one request and produces one response.
    ///
    /// This is the transport-independent entry point: the server calls it
    /// after collecting the body, and tests call it directly.
    pub async fn call(&self, req: http::Request<Bytes>) -> Response {
        let span = info_span!("request", method = %req.method(), path = %req.uri().path());
        async move {
            let started = Instant::now();
            let response = self.dispatch(req).await;
            info!(
                status = response.status().code(),
                elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                "request completed"
            );
            response
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, req: http::Request<Bytes>) -> Response {
        let (parts, body) = req.into_parts();
        let mut request = Request::new(parts, body, HashMap::new());

        for guard in &self.guards {
            if let Err(rejection) = guard.check(&request) {
                return rejection;
            }
        }

        let path = request.path().to_owned();
        let Ok(method) = request.method().parse::<Method>() else {
            return self.miss(request.method(), &path);
        };
        let Some((route, params)) = self.lookup(method, &path) else {
            return self.miss(method.as_str(), &path);
        };

        for guard in &route.guards {
            if let Err(rejection) = guard.check(&request) {
                return rejection;
            }
        }

        request.params = params;
        route.handler.call(request, self.state.clone()).await
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(&Route<S>, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((matched.value, params))
    }

    /// 405 if some other method serves `path`, otherwise 404.
    fn miss(&self, method: &str, path: &str) -> Response {
        let known_path = self.routes.values().any(|tree| tree.at(path).is_ok());
        let err = if known_path {
            ApiError::MethodNotAllowed { method: method.to_owned(), path: path.to_owned() }
        } else {
            ApiError::RouteNotFound(path.to_owned())
        };
        err.into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::response::{Json, Message};
    use crate::status::Status;

    type Hits = Arc<AtomicUsize>;

    async fn echo_id(req: Request, hits: Hits) -> Json<String> {
        hits.fetch_add(1, Ordering::SeqCst);
        Json(req.param("id").unwrap_or_default().to_owned())
    }

    fn deny(req: &Request) -> Result<(), Response> {
        if req.header("x-deny").is_some() {
            Err(Response::message(Status::BadRequest, "denied"))
        } else {
            Ok(())
        }
    }

    fn request(method: &str, uri: &str) -> http::Request<Bytes> {
        http::Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap()
    }

    fn message(res: &Response) -> String {
        serde_json::from_slice::<Message>(res.body()).unwrap().message
    }

    #[tokio::test]
    async fn path_params_reach_the_handler() {
        let hits = Hits::default();
        let router = Router::new(hits.clone()).on(Method::Get, "/api/posts/{id}", echo_id);

        let res = router.call(request("GET", "/api/posts/42")).await;
        assert_eq!(res.status(), Status::Ok);
        assert_eq!(res.body(), br#""42""#);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_path_is_json_404() {
        let router = Router::new(Hits::default()).on(Method::Get, "/api/posts/{id}", echo_id);
        let res = router.call(request("GET", "/nope")).await;
        assert_eq!(res.status(), Status::NotFound);
        assert_eq!(message(&res), "Could not find resource at /nope");
    }

    #[tokio::test]
    async fn known_path_wrong_method_is_405() {
        let router = Router::new(Hits::default()).on(Method::Get, "/api/posts/{id}", echo_id);

        let res = router.call(request("POST", "/api/posts/1")).await;
        assert_eq!(res.status(), Status::MethodNotAllowed);
        assert_eq!(message(&res), "Method POST is not allowed on /api/posts/1");

        let res = router.call(request("PATCH", "/api/posts/1")).await;
        assert_eq!(res.status(), Status::MethodNotAllowed);
    }

    #[tokio::test]
    async fn router_guard_short_circuits_before_handler() {
        let hits = Hits::default();
        let router = Router::new(hits.clone())
            .guard(deny)
            .on(Method::Get, "/api/posts/{id}", echo_id);

        let req = http::Request::builder()
            .uri("/api/posts/1")
            .header("x-deny", "1")
            .body(Bytes::new())
            .unwrap();
        let res = router.call(req).await;
        assert_eq!(res.status(), Status::BadRequest);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn route_guard_applies_to_its_route_only() {
        let hits = Hits::default();
        let router = Router::new(hits.clone())
            .on_guarded(Method::Delete, "/api/posts/{id}", deny, echo_id)
            .on(Method::Get, "/api/posts/{id}", echo_id);

        let guarded = |method: &str| {
            http::Request::builder()
                .method(method)
                .uri("/api/posts/5")
                .header("x-deny", "1")
                .body(Bytes::new())
                .unwrap()
        };

        assert_eq!(router.call(guarded("DELETE")).await.status(), Status::BadRequest);
        assert_eq!(router.call(guarded("GET")).await.status(), Status::Ok);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
