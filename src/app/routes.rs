use tracing::info;

use crate::{Next, Rejection, Request, Response};

pub async fn check_profile(req: Request, next: Next) -> Response {
    info!("checking profile access");
    next.run(req).await
}

pub async fn profile(_req: Request) -> &'static str {
    "Profile page"
}

pub async fn search(req: Request) -> Result<String, Rejection> {
    let term = req.query("term")
        .filter(|term| !term.is_empty())
        .ok_or_else(|| Rejection::Validation("Missing term query parameter".into()))?;
    Ok(format!("Search results for \"{term}\""))
}
