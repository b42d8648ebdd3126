//! Metrics collection and exposition.
//!
//! # Metrics
//! - `robot_gate_requests_total` (counter): requests by method, endpoint, status
//! - `robot_gate_request_duration_seconds` (histogram): latency by endpoint
//! - `robot_gate_rate_limited_total` (counter): rejections by scope
//! - `robot_gate_redirects_total` (counter): unverified sessions sent to the gate
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup
//! - Endpoint labels use logical names, never raw paths, to bound cardinality

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::{Endpoint, ResolvedEndpoint};

/// Install the Prometheus recorder and its scrape endpoint.
/// Must be called from inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, endpoint: &'static str, status: u16, start: Instant) {
    counter!(
        "robot_gate_requests_total",
        "method" => method.to_string(),
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("robot_gate_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(scope: &'static str) {
    counter!("robot_gate_rate_limited_total", "scope" => scope).increment(1);
}

pub fn record_gate_redirect() {
    counter!("robot_gate_redirects_total").increment(1);
}

/// Middleware recording one sample per request. Must run inside the
/// endpoint resolution layer.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let endpoint = ResolvedEndpoint::of(&request).map_or("none", Endpoint::name);

    let response = next.run(request).await;

    record_request(&method, endpoint, response.status().as_u16(), start);
    response
}
