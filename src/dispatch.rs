//! Per-request chain execution.
//!
//! A [`Dispatcher`] is the frozen registration table. Each request gets its
//! own [`Next`], a cursor into that table, so concurrent requests never share
//! chain state. The chain is computed lazily: `Next::run` skips entries whose
//! scope does not match and invokes the first one that does.
//!
//! ```text
//! dispatch(req)
//!   └─ Next { cursor: 0 }.run(req)
//!        ├─ skip entries that do not match method/path
//!        ├─ entry.call(req, Next { cursor: i + 1 })
//!        │    ├─ return a response        → short-circuit
//!        │    └─ next.run(req).await      → advance
//!        └─ end of table                  → 404
//! ```
//!
//! `Next::run` takes `self` by value, so a handler can advance at most once.
//! Suspending before advancing (a timer, an external event) is just an
//! `.await`: the request's task yields and other requests keep running. If the
//! connection goes away, hyper drops the request future and the rest of the
//! chain never runs.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::error;

use crate::rejection::Rejection;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::{Entry, Hit};

/// A frozen, cheaply cloneable registration table.
///
/// Obtained from [`Router::into_dispatcher`](crate::Router::into_dispatcher).
#[derive(Clone)]
pub struct Dispatcher {
    entries: Arc<[Entry]>,
}

impl Dispatcher {
    pub(crate) fn new(entries: Vec<Entry>) -> Self {
        Self { entries: entries.into() }
    }

    /// Runs `req` through the chain and returns the single response.
    pub async fn dispatch(&self, req: impl Into<Request>) -> Response {
        let next = Next { entries: Arc::clone(&self.entries), cursor: 0 };
        next.run(req.into()).await
    }
}

/// The one-shot capability to continue a request's chain.
///
/// Handed to every middleware. Call [`Next::run`] to pass the request on and
/// get the downstream response back, or drop it to end the chain.
pub struct Next {
    entries: Arc<[Entry]>,
    cursor: usize,
}

impl Next {
    /// Invokes the next entry that applies to `req`.
    ///
    /// Returns `404 Not Found` when no entry is left. A panic inside the
    /// invoked entry (or anything it calls) is logged and becomes
    /// `500 Internal Server Error`.
    pub async fn run(mut self, mut req: Request) -> Response {
        let found = self.entries[self.cursor..].iter()
            .enumerate()
            .find_map(|(offset, entry)| {
                let hit = entry.scope.matches(&req.method, &req.path)?;
                Some((offset, Arc::clone(&entry.handler), hit))
            });

        let Some((offset, handler, hit)) = found else {
            return Rejection::NotFound.into_response();
        };

        self.cursor += offset + 1;
        if let Hit::Route(params) = hit {
            req.params = params;
        }

        let method = req.method.clone();
        let path = req.path.clone();

        match AssertUnwindSafe(async move { handler.call(req, self).await }).catch_unwind().await {
            Ok(res) => res,
            Err(panic) => {
                error!(%method, %path, reason = panic_message(&*panic), "handler panicked");
                Rejection::Internal.into_response()
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic.downcast_ref::<&'static str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use bytes::Bytes;
    use http::{Method, StatusCode};

    use super::*;
    use crate::Router;

    type Trace = Arc<Mutex<Vec<&'static str>>>;

    fn get(uri: &str) -> http::Request<Bytes> {
        http::Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    /// Middleware that records `name` and advances.
    fn mark(trace: Trace, name: &'static str) -> impl crate::Middleware {
        move |req: Request, next: Next| {
            trace.lock().unwrap().push(name);
            next.run(req)
        }
    }

    /// Middleware that records `name` and answers without advancing.
    fn stop(trace: Trace, name: &'static str) -> impl crate::Middleware {
        move |_req: Request, _next: Next| {
            trace.lock().unwrap().push(name);
            async move { Response::text(name) }
        }
    }

    #[tokio::test]
    async fn runs_entries_in_registration_order() {
        let trace = Trace::default();
        let app = Router::new()
            .with(mark(trace.clone(), "a"))
            .with(mark(trace.clone(), "b"))
            .with(stop(trace.clone(), "c"))
            .with(mark(trace.clone(), "d"))
            .into_dispatcher();

        let res = app.dispatch(get("/")).await;

        assert_eq!(res.body(), b"c");
        assert_eq!(*trace.lock().unwrap(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn falls_through_to_not_found() {
        let trace = Trace::default();
        let app = Router::new()
            .with(mark(trace.clone(), "a"))
            .with_prefix("/admin", stop(trace.clone(), "admin"))
            .into_dispatcher();

        let res = app.dispatch(get("/public")).await;

        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(*trace.lock().unwrap(), ["a"]);
    }

    #[tokio::test]
    async fn empty_table_is_not_found() {
        let app = Router::new().into_dispatcher();
        assert_eq!(app.dispatch(get("/")).await.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn middleware_after_route_only_sees_unanswered_requests() {
        let trace = Trace::default();
        let app = Router::new()
            .with(mark(trace.clone(), "before"))
            .on(Method::GET, "/hit", |_req: Request| async { "hit" })
            .with(mark(trace.clone(), "after"))
            .into_dispatcher();

        assert_eq!(app.dispatch(get("/hit")).await.body(), b"hit");
        assert_eq!(*trace.lock().unwrap(), ["before"]);

        trace.lock().unwrap().clear();
        assert_eq!(app.dispatch(get("/miss")).await.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(*trace.lock().unwrap(), ["before", "after"]);
    }

    #[tokio::test]
    async fn route_middleware_guards_its_handler() {
        async fn guard(req: Request, next: Next) -> Response {
            if req.query("token").is_none() {
                return Rejection::Unauthorized("no token".into()).into_response();
            }
            next.run(req).await
        }

        let app = Router::new()
            .before(Method::GET, "/secret", guard)
            .on(Method::GET, "/secret", |_req: Request| async { "the secret" })
            .into_dispatcher();

        assert_eq!(app.dispatch(get("/secret")).await.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(app.dispatch(get("/secret?token=1")).await.body(), b"the secret");
    }

    #[tokio::test]
    async fn downstream_observes_mutations() {
        async fn stamp(mut req: Request, next: Next) -> Response {
            req.context_mut().insert("who", String::from("middleware"));
            next.run(req).await
        }
        async fn read(req: Request) -> String {
            req.context().get::<String>("who").cloned().unwrap_or_default()
        }

        let app = Router::new()
            .with(stamp)
            .on(Method::GET, "/", read)
            .into_dispatcher();

        assert_eq!(app.dispatch(get("/")).await.body(), b"middleware");
    }

    #[tokio::test]
    async fn route_params_reach_the_handler() {
        let app = Router::new()
            .on(Method::GET, "/users/{id}", |req: Request| async move {
                format!("user {}", req.param("id").unwrap_or("?"))
            })
            .into_dispatcher();

        assert_eq!(app.dispatch(get("/users/42")).await.body(), b"user 42");
    }

    #[tokio::test]
    async fn upstream_can_rewrite_downstream_response() {
        async fn tag(req: Request, next: Next) -> Response {
            let mut res = next.run(req).await;
            res.insert_header("x-powered-by", "midway");
            res
        }

        let app = Router::new()
            .with(tag)
            .on(Method::GET, "/", |_req: Request| async { "ok" })
            .into_dispatcher();

        let res = app.dispatch(get("/")).await;
        assert_eq!(res.header("x-powered-by"), Some("midway"));
    }

    #[tokio::test]
    async fn panic_becomes_500_seen_by_upstream() {
        let seen = Arc::new(Mutex::new(None));
        let observer = {
            let seen = Arc::clone(&seen);
            move |req: Request, next: Next| {
                let seen = Arc::clone(&seen);
                async move {
                    let res = next.run(req).await;
                    *seen.lock().unwrap() = Some(res.status_code());
                    res
                }
            }
        };

        let app = Router::new()
            .with(observer)
            .on(Method::GET, "/boom", |_req: Request| async {
                if true {
                    panic!("boom");
                }
                "unreachable"
            })
            .into_dispatcher();

        let res = app.dispatch(get("/boom")).await;

        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(*seen.lock().unwrap(), Some(StatusCode::INTERNAL_SERVER_ERROR));

        // The dispatcher is still usable afterwards.
        assert_eq!(app.dispatch(get("/other")).await.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_request_stops_the_chain() {
        let trace = Trace::default();
        let app = Router::new()
            .with(|req: Request, next: Next| async move {
                tokio::time::sleep(Duration::from_secs(3)).await;
                next.run(req).await
            })
            .with(mark(trace.clone(), "after-delay"))
            .into_dispatcher();

        let outcome = tokio::time::timeout(Duration::from_secs(1), app.dispatch(get("/"))).await;
        assert!(outcome.is_err());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(trace.lock().unwrap().is_empty());
    }
}
