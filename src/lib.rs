//! # midway
//!
//! A minimal HTTP framework built around one idea: an ordered middleware
//! chain.
//!
//! ## The contract
//!
//! Every registration, global middleware, prefix middleware, route guard or
//! route handler, goes into one ordered table. A request walks that table
//! front to back, visiting only the entries that apply to it. Each entry
//! either answers (and the walk stops there) or calls `next` to hand the
//! request onward. Run off the end and the answer is `404`.
//!
//! - **Advance once** — [`Next::run`] consumes the capability
//! - **Short-circuit** — return a response without calling `next`
//! - **Suspend** — `.await` anything before calling `next`; other requests
//!   keep flowing
//! - **Share data** — mutate the [`Request`] (parsed body, [`Context`])
//!   before passing it on
//! - **Fail safely** — a panicking handler becomes a `500`, never a dead
//!   process
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use midway::{Method, Next, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .with(midway::middleware::trace)
//!         .with(block_delete)
//!         .on(Method::GET, "/users/{id}", get_user);
//!
//!     Server::bind("0.0.0.0:3000".parse().unwrap())
//!         .await
//!         .unwrap()
//!         .serve(app)
//!         .await
//!         .unwrap();
//! }
//!
//! async fn block_delete(req: Request, next: Next) -> Response {
//!     if req.method() == Method::DELETE {
//!         return Response::text("DELETE disabled");
//!     }
//!     next.run(req).await
//! }
//!
//! async fn get_user(req: Request) -> String {
//!     format!("user {}", req.param("id").unwrap_or("unknown"))
//! }
//! ```

mod dispatch;
mod error;
mod handler;
mod rejection;
mod request;
mod response;
mod router;
mod server;

pub mod app;
pub mod config;
pub mod middleware;

pub use config::Config;
pub use dispatch::{Dispatcher, Next};
pub use error::Error;
pub use handler::{Handler, Middleware};
pub use http::{Method, StatusCode};
pub use rejection::Rejection;
pub use request::{Context, Request};
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
