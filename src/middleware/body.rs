use serde_json::{Map, Value};
use tracing::debug;

use crate::{IntoResponse, Next, Rejection, Request, Response};

/// Decodes `application/json` bodies into [`Request::parsed`].
///
/// Requests with another content type, or an empty body, pass through
/// untouched. A malformed document is rejected with `400`.
pub async fn json(mut req: Request, next: Next) -> Response {
    if !has_content_type(&req, "application/json") || req.body().is_empty() {
        return next.run(req).await;
    }

    match serde_json::from_slice::<Value>(req.body()) {
        Ok(value) => {
            req.set_parsed(value);
            next.run(req).await
        }
        Err(e) => {
            debug!(path = req.path(), "malformed JSON body: {e}");
            Rejection::Validation("Malformed JSON body".into()).into_response()
        }
    }
}

/// Decodes `application/x-www-form-urlencoded` bodies into
/// [`Request::parsed`] as an object of string values.
pub async fn form(mut req: Request, next: Next) -> Response {
    if has_content_type(&req, "application/x-www-form-urlencoded") {
        let fields: Map<String, Value> = url::form_urlencoded::parse(req.body())
            .into_owned()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        req.set_parsed(Value::Object(fields));
    }
    next.run(req).await
}

/// Compares the media type, ignoring parameters such as `charset`.
fn has_content_type(req: &Request, expected: &str) -> bool {
    req.header("content-type")
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(expected))
}
