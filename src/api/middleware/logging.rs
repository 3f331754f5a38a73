//! Logging middleware for request/response tracing.
//!
//! Logs incoming requests and outgoing responses with timing information
//! inside an `http_request` span keyed by the request ID.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};

use super::RequestId;

/// Middleware that logs request and response information.
///
/// # Logged Information
/// - Request: HTTP method, path, request ID
/// - Response: status code, duration in milliseconds, request ID
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let span = info_span!(
        "http_request",
        method = %method,
        uri = %uri,
        request_id = %request_id
    );

    async move {
        info!(path = %uri.path(), "Request received");

        let start = Instant::now();
        let response = next.run(request).await;
        let duration = start.elapsed();

        let status = response.status();
        if status.is_server_error() {
            warn!(
                status = %status.as_u16(),
                duration_ms = %duration.as_millis(),
                "Response sent"
            );
        } else {
            info!(
                status = %status.as_u16(),
                duration_ms = %duration.as_millis(),
                "Response sent"
            );
        }

        response
    }
    .instrument(span)
    .await
}
