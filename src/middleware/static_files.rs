use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use http::Method;
use tracing::{debug, warn};

use crate::{ContentType, Middleware, Next, Request, Response};

/// Serves files below `root` for `GET` and `HEAD` requests.
///
/// `/` and other directory paths map to their `index.html`. Anything that is
/// not a readable file under `root` falls through to the next entry, and
/// paths with `..` segments are never looked up. `root` is checked once, here:
/// if it is not a directory the middleware only forwards.
pub fn serve_dir(root: PathBuf) -> impl Middleware {
    let root = if root.is_dir() {
        Some(Arc::new(root))
    } else {
        warn!(root = %root.display(), "static directory not found, static files disabled");
        None
    };

    move |req: Request, next: Next| {
        let root = root.clone();
        async move {
            let Some(root) = root else {
                return next.run(req).await;
            };
            if *req.method() != Method::GET && *req.method() != Method::HEAD {
                return next.run(req).await;
            }
            let Some(file) = resolve(&root, req.path()) else {
                return next.run(req).await;
            };
            match load(file).await {
                Some((content_type, _)) if *req.method() == Method::HEAD => {
                    Response::builder().bytes(content_type, Vec::new())
                }
                Some((content_type, contents)) => Response::builder().bytes(content_type, contents),
                None => next.run(req).await,
            }
        }
    }
}

/// Maps a request path onto `root`, refusing to leave it.
fn resolve(root: &Path, path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(path).ok()?;
    let mut file = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['\\', '\0']) => return None,
            s => file.push(s),
        }
    }
    Some(file)
}

async fn load(mut file: PathBuf) -> Option<(ContentType, Vec<u8>)> {
    let meta = tokio::fs::metadata(&file).await.ok()?;
    if meta.is_dir() {
        file.push("index.html");
    }

    match tokio::fs::read(&file).await {
        Ok(contents) => {
            let ext = file.extension().and_then(|e| e.to_str()).unwrap_or_default();
            debug!(file = %file.display(), "serving static file");
            Some((ContentType::from_extension(ext), contents))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            warn!(file = %file.display(), "static file unreadable: {e}");
            None
        }
    }
}
