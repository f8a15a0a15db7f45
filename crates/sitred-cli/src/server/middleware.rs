//! Middleware wrapped around every route.

use std::any::Any;
use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{error, info};

use super::routes::json_error;
use crate::utils::logging::ACCESS_TARGET;

/// Methods the server answers.
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Reject requests that do not identify their client.
pub async fn require_user_agent(request: Request, next: Next) -> Response {
    let has_user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .is_some_and(|value| !value.as_bytes().trim_ascii().is_empty());

    if !has_user_agent {
        return json_error(StatusCode::FORBIDDEN, "User-Agent header is required.");
    }

    next.run(request).await
}

/// Answer `OPTIONS` directly and reject anything besides `GET` and `HEAD`.
pub async fn allow_methods(request: Request, next: Next) -> Response {
    let allow = HeaderValue::from_static(ALLOWED_METHODS);

    match *request.method() {
        Method::GET | Method::HEAD => next.run(request).await,
        Method::OPTIONS => (StatusCode::NO_CONTENT, [(header::ALLOW, allow)]).into_response(),
        _ => {
            let mut response = json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed.");
            response.headers_mut().insert(header::ALLOW, allow);
            response
        },
    }
}

/// Write one access-log record per request.
pub async fn access_log(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "-".to_owned(), |ConnectInfo(addr)| addr.to_string());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_owned();

    let response = next.run(request).await;

    info!(
        target: ACCESS_TARGET,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        remote_addr = %remote_addr,
        user_agent = %user_agent,
        "request"
    );

    response
}

/// Turn a handler panic into a logged, generic 500.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    error!(panic = detail, "request handler panicked");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
}
