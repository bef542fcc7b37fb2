//! The `/users` endpoints.

use serde_json::{Value, json};
use tracing::info;

use super::is_truthy;
use crate::{IntoResponse, Json, Method, Next, Rejection, Request, Response, Router, StatusCode};

/// Routes mounted under `/users`.
pub fn router() -> Router {
    Router::new()
        .on(Method::GET, "/", all_users)
        .on(Method::POST, "/", create_user)
        .before(Method::POST, "/test-json", validate_secret)
        .on(Method::POST, "/test-json", test_json)
        .on(Method::POST, "/test-form", test_form)
}

/// Requires truthy `name` and `age` body fields.
pub async fn validate_user(req: Request, next: Next) -> Response {
    if !is_truthy(req.field("name")) || !is_truthy(req.field("age")) {
        return Rejection::Validation("Missing name or age".into()).into_response();
    }
    next.run(req).await
}

pub async fn user_is_valid(_req: Request) -> &'static str {
    "User is valid!"
}

/// Requires a truthy `secret` body field.
pub async fn validate_secret(req: Request, next: Next) -> Response {
    if !is_truthy(req.field("secret")) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response();
    }
    next.run(req).await
}

async fn all_users(_req: Request) -> &'static str {
    "All users"
}

async fn create_user(_req: Request) -> &'static str {
    "Create a user"
}

async fn test_json(req: Request) -> Json<Value> {
    let body = echo(&req);
    info!(%body, "received JSON body");
    Json(json!({ "message": "JSON parsed successfully!", "yourData": body }))
}

async fn test_form(req: Request) -> Json<Value> {
    let body = echo(&req);
    info!(%body, "received form body");
    Json(json!({ "message": "Form data parsed successfully!", "yourData": body }))
}

fn echo(req: &Request) -> Value {
    req.parsed().cloned().unwrap_or_else(|| json!({}))
}
