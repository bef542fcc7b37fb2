use std::time::Instant;

use tracing::{info, warn};

use crate::{Next, Request, Response};

/// Logs every request once its response is known.
///
/// Register it early: it only measures what runs after it.
pub async fn trace(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.path().to_owned();

    let res = next.run(req).await;

    let status = res.status_code();
    let duration_ms = start.elapsed().as_millis() as u64;
    if status.is_server_error() {
        warn!(%method, %path, status = status.as_u16(), duration_ms, "request failed");
    } else {
        info!(%method, %path, status = status.as_u16(), duration_ms, "request completed");
    }
    res
}
