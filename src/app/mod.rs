//! The demo application served by the `midway` binary.
//!
//! The whole point of the demo is the ordering, so here it is in one place:
//!
//! | # | Entry | Effect |
//! |---|---|---|
//! | 1 | `json` | parse JSON bodies |
//! | 2 | `serve_dir` | static files from the public directory |
//! | 3 | `trace` | log method, path, status, latency |
//! | 4 | `uppercase_name` | `body.name` → upper case |
//! | 5 | `magic` | answers `/magic` itself |
//! | 6 | `count_requests` | total counter |
//! | 7 | `count_per_path` | per-path counter |
//! | 8 | `stamp_request_time` | `requestTime` in the context |
//! | 9 | `block_delete` | every `DELETE` → 403 |
//! | 10 | `POST /users` | name/age guard, then "User is valid!" |
//! | 11 | `form` | parse urlencoded bodies |
//! | 12 | `log_received` | log arrival with `requestTime` |
//! | 13 | `slow_down` | `?slow=true` waits before continuing |
//! | 14 | `/users/*` | users sub-router |
//! | 15 | `GET /profile` | access log, then "Profile page" |
//! | 16 | `GET /search` | requires `?term=` |
//!
//! Because `POST /users` sits at 10, the users sub-router's own `POST /`
//! handler is never reached, and `POST /users` is never delayed. Everything
//! else, the sub-router's routes included, passes `slow_down` first.

use std::sync::Arc;

use serde_json::Value;

use crate::{Config, Method, Router, middleware};

pub mod pipeline;
pub mod routes;
pub mod stats;
pub mod users;

pub use stats::RequestStats;

/// Builds the demo route table.
pub fn router(config: &Config, stats: Arc<RequestStats>) -> Router {
    Router::new()
        .with(middleware::json)
        .with(middleware::serve_dir(config.public_dir.clone()))
        .with(middleware::trace)
        .with(pipeline::uppercase_name)
        .with(pipeline::magic)
        .with(pipeline::count_requests(Arc::clone(&stats)))
        .with(pipeline::count_per_path(stats))
        .with(pipeline::stamp_request_time)
        .with(pipeline::block_delete)
        .before(Method::POST, "/users", users::validate_user)
        .on(Method::POST, "/users", users::user_is_valid)
        .with(middleware::form)
        .with(pipeline::log_received)
        .with(pipeline::slow_down(config.slow_delay))
        .nest("/users", users::router())
        .before(Method::GET, "/profile", routes::check_profile)
        .on(Method::GET, "/profile", routes::profile)
        .on(Method::GET, "/search", routes::search)
}

/// Presence test for body fields: missing, `null`, `false`, `0` and `""`
/// all count as absent.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}
