//! Prometheus metrics for lockbox-server.
//!
//! Exposes request metrics in Prometheus format at the `/metrics` endpoint.

use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder and return a handle for rendering.
///
/// Must be called once at server startup before any metrics are recorded.
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    describe_counter!(
        "lockbox_http_requests_total",
        "Total number of HTTP API requests processed"
    );
    describe_histogram!(
        "lockbox_http_request_duration_seconds",
        "Duration of HTTP API requests in seconds"
    );
    describe_counter!(
        "lockbox_http_errors_total",
        "Total number of HTTP API errors by status code"
    );

    handle
}

pub fn record_http_request(method: &str, route: &str, duration: Duration) {
    counter!(
        "lockbox_http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => "ok"
    )
    .increment(1);
    histogram!(
        "lockbox_http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_http_error(method: &str, route: &str, status: u16, duration: Duration) {
    counter!(
        "lockbox_http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => "error"
    )
    .increment(1);
    counter!(
        "lockbox_http_errors_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "code" => status.to_string()
    )
    .increment(1);
    histogram!(
        "lockbox_http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Times a request and records metrics on completion.
pub struct RequestTimer {
    method: String,
    route: String,
    start: Instant,
}

impl RequestTimer {
    pub fn new(method: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            route: route.into(),
            start: Instant::now(),
        }
    }

    pub fn success(self) {
        record_http_request(&self.method, &self.route, self.start.elapsed());
    }

    pub fn error(self, status: u16) {
        record_http_error(&self.method, &self.route, status, self.start.elapsed());
    }
}

/// Middleware recording every routed API request. Labels use the route template,
/// not the concrete path, to keep cardinality bounded.
pub async fn track_http(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let timer = RequestTimer::new(req.method().as_str(), route);

    let response = next.run(req).await;

    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        timer.error(status.as_u16());
    } else {
        timer.success();
    }
    response
}
