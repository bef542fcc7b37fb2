//! HTTP server and graceful shutdown.
//!
//! Each accepted connection runs in its own task; each request on it runs
//! its own chain through the shared [`Dispatcher`]. A request that is waiting
//! (a timer in some middleware, a slow handler) holds up nothing but itself.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Immediately stops `listener.accept()` — no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::error::Error as StdError;
use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::rejection::Rejection;
use crate::response::IntoResponse;
use crate::router::Router;

/// Default for [`Server::max_body_size`]: 100 KiB.
pub(crate) const DEFAULT_MAX_BODY_SIZE: usize = 100 * 1024;

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
    max_body_size: usize,
}

impl Server {
    /// Binds the listening socket. Port `0` picks a free port; see
    /// [`Server::local_addr`].
    ///
    /// ```rust,no_run
    /// # async fn run() -> Result<(), midway::Error> {
    /// use midway::{Router, Server};
    /// Server::bind("0.0.0.0:3000".parse().unwrap()).await?.serve(Router::new()).await
    /// # }
    /// ```
    pub async fn bind(addr: SocketAddr) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, max_body_size: DEFAULT_MAX_BODY_SIZE })
    }

    /// Caps request bodies at `limit` bytes. Larger bodies are answered with
    /// `413 Payload Too Large` without reaching the router.
    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`Server::serve`], but stops accepting when `signal` resolves.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        // Registration ends here: the dispatcher is immutable and shared by
        // every connection task.
        let dispatcher = router.into_dispatcher();
        let addr = self.listener.local_addr()?;
        let limit = self.max_body_size;

        info!(%addr, max_body_size = limit, "midway listening");

        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM immediately stops
                // accepting new connections, even if more are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = self.listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let dispatcher = dispatcher.clone();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection. When the
                        // client disconnects hyper drops the pending future,
                        // which cancels the rest of that request's chain.
                        let svc = service_fn(move |req| {
                            let dispatcher = dispatcher.clone();
                            async move { dispatch(dispatcher, req, limit, remote_addr).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("midway stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Collects the body, then runs one request through the chain.
///
/// Every failure becomes a response (400, 404, 413, 500, ...), so hyper never
/// sees an error.
async fn dispatch(
    dispatcher: Dispatcher,
    req: hyper::Request<hyper::body::Incoming>,
    limit: usize,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match read_body(body, limit).await {
        Ok(body) => body,
        Err(rejection) => {
            debug!(peer = %remote_addr, path = %parts.uri.path(), "request body refused: {rejection}");
            return Ok(rejection.into_response().into_inner());
        }
    };

    let response = dispatcher.dispatch(http::Request::from_parts(parts, body)).await;
    Ok(response.into_inner())
}

/// Buffers at most `limit` bytes of `body`.
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, Rejection>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(Rejection::PayloadTooLarge),
        Err(e) => {
            debug!("failed to read request body: {e}");
            Err(Rejection::Validation("Unreadable request body".into()))
        }
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available. If a handler cannot be installed the
/// corresponding arm never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::{Empty, StreamBody};
    use hyper::body::Frame;

    use super::*;

    #[tokio::test]
    async fn body_within_limit_is_collected() {
        let body = read_body(Full::new(Bytes::from_static(b"hello")), 5).await.unwrap();
        assert_eq!(body, "hello");

        let body = read_body(Empty::<Bytes>::new(), 0).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn body_over_limit_is_413() {
        let err = read_body(Full::new(Bytes::from(vec![b'x'; 1025])), 1024).await.unwrap_err();
        assert!(matches!(err, Rejection::PayloadTooLarge));
        assert_eq!(err.status(), http::StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn chunked_body_is_cut_off_at_the_limit() {
        let chunks = (0..8).map(|_| Ok::<_, Infallible>(Frame::data(Bytes::from(vec![b'x'; 512]))));
        let body = StreamBody::new(futures::stream::iter(chunks));
        let err = read_body(body, 2048).await.unwrap_err();
        assert!(matches!(err, Rejection::PayloadTooLarge));
    }

    #[tokio::test]
    async fn read_errors_are_400() {
        let chunks = vec![
            Ok(Frame::data(Bytes::from_static(b"partial"))),
            Err(std::io::Error::other("connection reset")),
        ];
        let body = StreamBody::new(futures::stream::iter(chunks));
        let err = read_body(body, 1024).await.unwrap_err();
        assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
    }
}
