//! Protocol multiplexer: HTTP/1 JSON and HTTP/2 gRPC on one listener.
//!
//! Every accepted connection is served by hyper's auto builder, which
//! negotiates HTTP/1 or HTTP/2 from the wire. Requests whose
//! `content-type` starts with `application/grpc` route to the gRPC router,
//! everything else to the JSON router, so clients need neither a second
//! port nor ALPN.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::response::Response;
use http::Request;
use http::header::CONTENT_TYPE;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tower::ServiceExt;

use super::{ServeError, ServeResult};
use crate::config::ServerConfig;
use crate::server::shutdown_signal;
use crate::{TRACING_TARGET_SHUTDOWN, TRACING_TARGET_STARTUP};

/// Bound on slow-header attacks against the HTTP/1 surface.
const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Server-initiated HTTP/2 keepalive ping period.
const HTTP2_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// How long an unanswered keepalive ping may hang before the connection is
/// considered dead.
const HTTP2_KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Steers each request to one of the two routers by content type.
#[derive(Clone)]
struct MultiplexService {
    rest: Router,
    grpc: Router,
}

impl MultiplexService {
    fn is_grpc<B>(request: &Request<B>) -> bool {
        request
            .headers()
            .get(CONTENT_TYPE)
            .map(|value| value.as_bytes().starts_with(b"application/grpc"))
            .unwrap_or(false)
    }
}

impl tower::Service<Request<Incoming>> for MultiplexService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Incoming>) -> Self::Future {
        let router = if Self::is_grpc(&request) {
            self.grpc.clone()
        } else {
            self.rest.clone()
        };
        let request = request.map(Body::new);

        Box::pin(async move {
            match router.oneshot(request).await {
                Ok(response) => Ok(response),
                Err(infallible) => match infallible {},
            }
        })
    }
}

/// Binds the shared listener and serves both surfaces until a shutdown
/// signal arrives, then drains under the configured deadline.
///
/// One connection's failure is logged and never tears down the other
/// protocol; only the shutdown signal or a listener error ends the loop.
pub async fn serve(rest: Router, grpc: Router, config: &ServerConfig) -> ServeResult {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        addr = %addr,
        "listening for HTTP and gRPC connections"
    );

    let service = TowerToHyperService::new(MultiplexService { rest, grpc });

    let mut builder = ConnBuilder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(HEADER_READ_TIMEOUT);
    builder
        .http2()
        .timer(TokioTimer::new())
        .keep_alive_interval(HTTP2_KEEPALIVE_INTERVAL)
        .keep_alive_timeout(HTTP2_KEEPALIVE_TIMEOUT);

    let graceful = GracefulShutdown::new();
    let mut shutdown = std::pin::pin!(shutdown_signal());

    loop {
        tokio::select! {
            () = &mut shutdown => break,

            accepted = listener.accept() => {
                let (stream, remote) = match accepted {
                    Ok(accepted) => accepted,
                    Err(error) => {
                        tracing::warn!(
                            target: TRACING_TARGET_STARTUP,
                            error = %error,
                            "failed to accept connection"
                        );
                        continue;
                    }
                };

                let io = TokioIo::new(stream);
                let connection = builder
                    .serve_connection_with_upgrades(io, service.clone())
                    .into_owned();
                let connection = graceful.watch(connection);

                tokio::spawn(async move {
                    if let Err(error) = connection.await {
                        tracing::debug!(
                            target: TRACING_TARGET_SHUTDOWN,
                            remote = %remote,
                            error = %error,
                            "connection closed with error"
                        );
                    }
                });
            }
        }
    }

    // New accepts cease immediately; in-flight connections get the
    // configured deadline to drain.
    drop(listener);

    let deadline = config.shutdown_timeout();
    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        deadline_secs = deadline.as_secs(),
        "draining in-flight connections"
    );

    if tokio::time::timeout(deadline, graceful.shutdown()).await.is_err() {
        tracing::warn!(
            target: TRACING_TARGET_SHUTDOWN,
            deadline_secs = deadline.as_secs(),
            "graceful shutdown deadline exceeded, closing remaining connections"
        );
    }

    Ok(())
}
