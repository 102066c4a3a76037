//! HTTP metrics middleware

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::Label;
use std::time::Instant;

/// Counter of handled requests
pub const REQUESTS_TOTAL: &str = "http_requests_total";
/// Histogram of request latency
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";

/// Records request count and latency by route template
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let labels = vec![
        Label::new("method", method),
        Label::new("path", path),
        Label::new("status", response.status().as_u16().to_string()),
    ];
    metrics::counter!(REQUESTS_TOTAL, labels.clone()).increment(1);
    metrics::histogram!(REQUEST_DURATION, labels).record(start.elapsed().as_secs_f64());

    response
}
