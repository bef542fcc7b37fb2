//! Built-in middleware.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns. Each item here is an ordinary
//! [`Middleware`](crate::Middleware): register it with
//! [`Router::with`](crate::Router::with) where it belongs in the ordering.
//!
//! - [`trace`] — one log line per request with method, path, status, latency
//! - [`json`], [`form`] — decode the request body into [`Request::parsed`](crate::Request::parsed)
//! - [`serve_dir`] — static files from a directory

mod body;
mod static_files;
mod trace;

pub use body::{form, json};
pub use static_files::serve_dir;
pub use trace::trace;
