//! Application-wide middleware, in the order the demo registers them.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{debug, info};

use super::stats::RequestStats;
use crate::{IntoResponse, Method, Middleware, Next, Rejection, Request, Response};

/// Context key holding the millisecond UNIX timestamp stamped on arrival.
pub const REQUEST_TIME: &str = "requestTime";

/// Upper-cases a string `name` field in the parsed body.
pub async fn uppercase_name(mut req: Request, next: Next) -> Response {
    if let Some(Value::String(name)) = req.parsed_mut().and_then(|body| body.get_mut("name")) {
        *name = name.to_uppercase();
        debug!(%name, "normalized name");
    }
    next.run(req).await
}

/// Answers `/magic` on its own, before any route is consulted.
pub async fn magic(req: Request, next: Next) -> Response {
    if req.path() == "/magic" {
        return Response::text("✨ Middleware is magic ✨");
    }
    next.run(req).await
}

pub fn count_requests(stats: Arc<RequestStats>) -> impl Middleware {
    move |req: Request, next: Next| {
        let total = stats.record_request();
        info!(total, "total requests so far");
        next.run(req)
    }
}

pub fn count_per_path(stats: Arc<RequestStats>) -> impl Middleware {
    move |req: Request, next: Next| {
        let hits = stats.record_hit(req.path());
        info!(path = req.path(), hits, "route hit count");
        next.run(req)
    }
}

/// Stores the arrival time under [`REQUEST_TIME`] for later entries.
pub async fn stamp_request_time(mut req: Request, next: Next) -> Response {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64);
    req.context_mut().insert(REQUEST_TIME, now);
    debug!(request_time = now, "request stamped");
    next.run(req).await
}

pub async fn block_delete(req: Request, next: Next) -> Response {
    if req.method() == Method::DELETE {
        return Rejection::Forbidden("DELETE disabled".into()).into_response();
    }
    next.run(req).await
}

pub async fn log_received(req: Request, next: Next) -> Response {
    let received_at = req.context().get::<u64>(REQUEST_TIME).copied();
    info!(method = %req.method(), path = req.path(), received_at, "request received");
    next.run(req).await
}

/// Holds `?slow=true` requests for `delay` before letting them continue.
pub fn slow_down(delay: Duration) -> impl Middleware {
    move |req: Request, next: Next| async move {
        if req.query("slow") == Some("true") {
            debug!(path = req.path(), delay_ms = delay.as_millis() as u64, "delaying request");
            tokio::time::sleep(delay).await;
        }
        next.run(req).await
    }
}
