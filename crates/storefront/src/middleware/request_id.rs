//! Per-request correlation IDs.
//!
//! The storefront runs directly on the public listener with nothing in front
//! of it, so IDs are minted here rather than trusted from inbound headers.
//! Each request gets a fresh UUID that shows up in three places: the request
//! span, the Sentry scope, and the `x-request-id` response header. A customer
//! quoting that header from an error page gives support the exact log lines
//! and Sentry event for their request.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// Response header carrying the correlation ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Mint a request ID and thread it through the span, Sentry, and the
/// response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    // Hyphenated UUIDs are always valid header values, but don't panic on it.
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
