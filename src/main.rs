//! Demo server: the middleware-chain walkthrough on port 3000.
//!
//! Run with:
//!   RUST_LOG=info cargo run
//!
//! Try:
//!   curl http://localhost:3000/magic
//!   curl 'http://localhost:3000/search?term=cat'
//!   curl 'http://localhost:3000/search?term=cat&slow=true'
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' -d '{"name":"a","age":1}'
//!   curl -X POST http://localhost:3000/users/test-json \
//!        -H 'content-type: application/json' -d '{"secret":"s","name":"bob"}'
//!   curl -X DELETE http://localhost:3000/anything

use std::sync::Arc;

use midway::app::{self, RequestStats};
use midway::{Config, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let stats = Arc::new(RequestStats::new());
    let router = app::router(&config, stats);

    Server::bind(config.socket_addr()?)
        .await?
        .max_body_size(config.max_body_size)
        .serve(router)
        .await?;

    Ok(())
}
