//! Security headers middleware.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// Middleware that adds security headers to all responses.
///
/// - **Cache-Control: no-store**
///   Challenge messages, nonces, and session payloads must never be served
///   from a cache.
///
/// - **X-Content-Type-Options: nosniff**
///   Responses are JSON and must be interpreted as declared.
///
/// - **X-Frame-Options: DENY**
///   The API is never rendered in a frame.
///
/// - **Strict-Transport-Security**
///   Bearer tokens only ever travel over HTTPS.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("cache-control", HeaderValue::from_static("no-store"));
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "strict-transport-security",
        HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
    );

    response
}
