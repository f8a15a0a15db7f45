//! HTTPS surface of the service.
//!
//! One route, `/`, answers with a `302 Found` to a random page of the
//! configured sitemap. Every request passes through the same stack, outermost
//! first:
//!
//! 1. access log (optional)
//! 2. panic recovery
//! 3. `User-Agent` requirement
//! 4. method allow-list
//! 5. request deadline
//!
//! [`serve`] terminates TLS itself and hands each connection to hyper, so the
//! header-read timeout and graceful shutdown stay under our control.

pub mod middleware;
pub mod routes;
pub mod shutdown;
pub mod tls;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use axum::extract::{ConnectInfo, Request};
use axum::routing::get;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use hyper_util::server::graceful::GracefulShutdown;
use sitred_core::RedirectSelector;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, info, warn};

/// Time allowed for a client to send its request headers.
pub const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for producing a response.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Time in-flight connections get to finish after a shutdown signal.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Router settings that come from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOptions {
    /// Write one access-log record per request.
    pub access_log: bool,
}

/// Build the application router.
pub fn router(selector: RedirectSelector, options: RouterOptions) -> Router {
    let routes = Router::new()
        .route("/", get(routes::redirect))
        .fallback(routes::not_found)
        .with_state(selector);

    with_middleware(routes, options)
}

fn with_middleware(routes: Router, options: RouterOptions) -> Router {
    let router = routes
        .layer(TimeoutLayer::new(WRITE_TIMEOUT))
        .layer(axum::middleware::from_fn(middleware::allow_methods))
        .layer(axum::middleware::from_fn(middleware::require_user_agent))
        .layer(CatchPanicLayer::custom(middleware::handle_panic));

    if options.access_log {
        router.layer(axum::middleware::from_fn(middleware::access_log))
    } else {
        router
    }
}

/// Accept TLS connections on `listener` and serve `app` until `shutdown`
/// resolves, then give open connections [`SHUTDOWN_TIMEOUT`] to finish.
pub async fn serve<F>(
    listener: TcpListener,
    tls: Arc<rustls::ServerConfig>,
    app: Router,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let acceptor = TlsAcceptor::from(tls);
    let graceful = GracefulShutdown::new();

    let mut builder = Builder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(HEADER_READ_TIMEOUT);

    tokio::pin!(shutdown);

    loop {
        let (stream, remote_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(connection) => connection,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                },
            },
            () = &mut shutdown => break,
        };

        let acceptor = acceptor.clone();
        let app = app.clone();
        let builder = builder.clone();
        let watcher = graceful.watcher();

        tokio::spawn(async move {
            let stream = match acceptor.accept(stream).await {
                Ok(stream) => stream,
                Err(e) => {
                    debug!(remote_addr = %remote_addr, error = %e, "TLS handshake failed");
                    return;
                },
            };

            let service = hyper::service::service_fn(move |mut request: Request<Incoming>| {
                request.extensions_mut().insert(ConnectInfo(remote_addr));
                app.clone().oneshot(request)
            });

            let connection = builder.serve_connection(TokioIo::new(stream), service);
            if let Err(e) = watcher.watch(connection).await {
                debug!(remote_addr = %remote_addr, error = %e, "connection closed with error");
            }
        });
    }

    drop(listener);
    info!("shutting down, waiting for open connections");

    tokio::select! {
        () = graceful.shutdown() => info!("all connections closed"),
        () = tokio::time::sleep(SHUTDOWN_TIMEOUT) => {
            warn!(timeout = ?SHUTDOWN_TIMEOUT, "timed out waiting for connections to close");
        },
    }

    Ok(())
}
