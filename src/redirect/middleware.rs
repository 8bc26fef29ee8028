use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

pub const TIMING_HEADER: &str = "x-shortener-timing-ms";

/// Log method, path, status and handling time of every request
pub async fn log_latency(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms,
        "Handled request"
    );
    response
        .headers_mut()
        .insert(TIMING_HEADER, HeaderValue::from(elapsed_ms));
    response
}
