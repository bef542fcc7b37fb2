//! Ordered registration table.
//!
//! Every registration, middleware or route, is appended to one list, and a
//! request walks that list in order. A global middleware registered before a
//! route therefore runs before it; one registered after a route only sees
//! requests the route did not answer.

use std::collections::HashMap;

use http::Method;
use matchit::Router as PathMatcher;

use crate::dispatch::Dispatcher;
use crate::handler::{BoxedMiddleware, Handler, Middleware};

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve)
/// or freeze it with [`Router::into_dispatcher`]. Each registration call
/// returns `self` so registrations chain naturally.
///
/// ```rust,no_run
/// # use midway::{Method, Next, Request, Response, Router};
/// # async fn log(req: Request, next: Next) -> Response { next.run(req).await }
/// # async fn require_token(req: Request, next: Next) -> Response { next.run(req).await }
/// # async fn get_user(_: Request) -> Response { Response::text("") }
/// Router::new()
///     .with(log)
///     .with_prefix("/admin", require_token)
///     .on(Method::GET, "/users/{id}", get_user);
/// ```
pub struct Router {
    pub(crate) entries: Vec<Entry>,
}

pub(crate) struct Entry {
    pub(crate) scope: Scope,
    pub(crate) handler: BoxedMiddleware,
}

/// Which requests an entry applies to.
pub(crate) enum Scope {
    All,
    /// Segment-aware prefix, stored without a trailing slash.
    Prefix(String),
    Route {
        method: Method,
        pattern: String,
        matcher: PathMatcher<()>,
    },
}

/// Outcome of matching a request against an entry's scope.
pub(crate) enum Hit {
    Any,
    Route(HashMap<String, String>),
}

impl Router {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends middleware that runs for every request.
    pub fn with(self, middleware: impl Middleware) -> Self {
        self.push(Scope::All, middleware.into_boxed())
    }

    /// Appends middleware that runs for `prefix` and every path below it.
    ///
    /// `/users` matches `/users` and `/users/42`, not `/usersx`.
    pub fn with_prefix(self, prefix: &str, middleware: impl Middleware) -> Self {
        self.push(Scope::prefix(prefix), middleware.into_boxed())
    }

    /// Appends a terminal handler for an exact method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route pattern.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.push(Scope::route(method, path), handler.into_boxed())
    }

    /// Appends route-scoped middleware for an exact method + path pair.
    ///
    /// Register it before the terminal handler for the same route; it may
    /// reject the request or call `next` to reach the handler.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route pattern.
    pub fn before(self, method: Method, path: &str, middleware: impl Middleware) -> Self {
        self.push(Scope::route(method, path), middleware.into_boxed())
    }

    /// Appends every entry of `router`, re-rooted under `prefix`.
    ///
    /// The nested entries take the position of this call in the ordering.
    /// A nested route registered at `/` answers on `prefix` itself.
    pub fn nest(mut self, prefix: &str, router: Router) -> Self {
        let prefix = trim_trailing_slash(prefix);
        for entry in router.entries {
            let scope = match entry.scope {
                Scope::All => Scope::prefix(prefix),
                Scope::Prefix(p) => Scope::prefix(&join(prefix, &p)),
                Scope::Route { method, pattern, .. } => Scope::route(method, &join(prefix, &pattern)),
            };
            self.entries.push(Entry { scope, handler: entry.handler });
        }
        self
    }

    /// Freezes the table. Nothing can be registered afterwards.
    pub fn into_dispatcher(self) -> Dispatcher {
        Dispatcher::new(self.entries)
    }

    fn push(mut self, scope: Scope, handler: BoxedMiddleware) -> Self {
        self.entries.push(Entry { scope, handler });
        self
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl Scope {
    fn prefix(prefix: &str) -> Self {
        match trim_trailing_slash(prefix) {
            "/" => Self::All,
            p => Self::Prefix(p.to_owned()),
        }
    }

    fn route(method: Method, path: &str) -> Self {
        let pattern = trim_trailing_slash(path).to_owned();
        let mut matcher = PathMatcher::new();
        matcher
            .insert(pattern.as_str(), ())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        Self::Route { method, pattern, matcher }
    }

    pub(crate) fn matches(&self, method: &Method, path: &str) -> Option<Hit> {
        match self {
            Self::All => Some(Hit::Any),
            Self::Prefix(prefix) => {
                let rest = path.strip_prefix(prefix.as_str())?;
                (rest.is_empty() || rest.starts_with('/')).then_some(Hit::Any)
            }
            Self::Route { method: m, matcher, .. } => {
                // GET routes answer HEAD too; hyper strips the body.
                if m != method && !(*m == Method::GET && *method == Method::HEAD) {
                    return None;
                }
                let matched = matcher.at(trim_trailing_slash(path)).ok()?;
                let params = matched.params.iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect();
                Some(Hit::Route(params))
            }
        }
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    }
}

fn join(prefix: &str, path: &str) -> String {
    match (prefix, path) {
        ("/", p) => p.to_owned(),
        (p, "/") => p.to_owned(),
        (p, q) => format!("{p}{q}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(method: Method, path: &str) -> Scope {
        Scope::route(method, path)
    }

    #[test]
    fn prefix_is_segment_aware() {
        let scope = Scope::prefix("/users/");
        assert!(scope.matches(&Method::GET, "/users").is_some());
        assert!(scope.matches(&Method::GET, "/users/42").is_some());
        assert!(scope.matches(&Method::GET, "/usersx").is_none());
        assert!(scope.matches(&Method::GET, "/").is_none());
    }

    #[test]
    fn root_prefix_matches_everything() {
        assert!(matches!(Scope::prefix("/"), Scope::All));
    }

    #[test]
    fn route_requires_method_and_exact_path() {
        let scope = route(Method::GET, "/search");
        assert!(scope.matches(&Method::GET, "/search").is_some());
        assert!(scope.matches(&Method::GET, "/search/").is_some());
        assert!(scope.matches(&Method::POST, "/search").is_none());
        assert!(scope.matches(&Method::GET, "/search/more").is_none());
    }

    #[test]
    fn get_routes_also_answer_head() {
        assert!(route(Method::GET, "/search").matches(&Method::HEAD, "/search").is_some());
        assert!(route(Method::POST, "/users").matches(&Method::HEAD, "/users").is_none());
        assert!(route(Method::HEAD, "/ping").matches(&Method::GET, "/ping").is_none());
    }

    #[test]
    fn route_extracts_params() {
        let scope = route(Method::GET, "/users/{id}");
        let Some(Hit::Route(params)) = scope.matches(&Method::GET, "/users/42") else {
            panic!("expected a route hit");
        };
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn join_handles_roots() {
        assert_eq!(join("/users", "/"), "/users");
        assert_eq!(join("/", "/search"), "/search");
        assert_eq!(join("/users", "/test-json"), "/users/test-json");
    }

    #[test]
    fn nest_reroots_scopes_in_place() {
        async fn noop(_req: crate::Request) -> &'static str { "" }
        async fn pass(req: crate::Request, next: crate::Next) -> crate::Response { next.run(req).await }

        let users = Router::new()
            .with(pass)
            .on(Method::GET, "/", noop)
            .on(Method::POST, "/test-json", noop);
        let app = Router::new().with(pass).nest("/users/", users).on(Method::GET, "/search", noop);

        let scopes: Vec<String> = app.entries.iter()
            .map(|e| match &e.scope {
                Scope::All => "*".to_owned(),
                Scope::Prefix(p) => format!("prefix {p}"),
                Scope::Route { method, pattern, .. } => format!("{method} {pattern}"),
            })
            .collect();

        assert_eq!(scopes, [
            "*",
            "prefix /users",
            "GET /users",
            "POST /users/test-json",
            "GET /search",
        ]);
    }
}
