//! Request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sitred_core::RedirectSelector;
use tracing::error;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    /// Short human-readable message.
    pub message: &'a str,
    /// HTTP status code, repeated for clients that only see the body.
    pub code: u16,
}

/// Build a JSON error response.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    let body = ErrorBody {
        message,
        code: status.as_u16(),
    };
    (status, Json(body)).into_response()
}

/// `GET /`: redirect to a random page of the sitemap.
///
/// Success is silent. Failures are logged once, with the full cause, while the
/// client only gets a generic message.
pub async fn redirect(State(selector): State<RedirectSelector>) -> Response {
    let url = match selector.select().await {
        Ok(url) => url,
        Err(err) => {
            error!(
                url = selector.sitemap_url(),
                error = %err,
                category = err.kind(),
                "failed to select redirect target"
            );
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, err.public_message());
        },
    };

    match location_header(&url) {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(reason) => {
            error!(
                url = selector.sitemap_url(),
                location = %url,
                error = %reason,
                category = "invalid_target",
                "sitemap entry cannot be used as a redirect target"
            );
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect target.")
        },
    }
}

/// An empty target would send the client straight back to `/`.
fn location_header(target: &str) -> Result<HeaderValue, String> {
    if target.is_empty() {
        return Err("sitemap location is empty".to_owned());
    }
    HeaderValue::try_from(target).map_err(|e| e.to_string())
}

/// Fallback for every other path.
pub async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "Not found.")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_location_header() {
        assert_eq!(
            location_header("https://example.com/a").unwrap(),
            "https://example.com/a"
        );
        assert!(location_header("").is_err());
        assert!(location_header("https://example.com/\nSet-Cookie: x").is_err());
    }
}
