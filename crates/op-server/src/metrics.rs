//! Request metrics
//!
//! Counts HTTP requests per status class and exports them in the
//! Prometheus text format on `/metrics`.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

/// Request counters
pub struct Metrics {
    pub requests_total: AtomicU64,
    pub requests_2xx: AtomicU64,
    /// Successful creates answer with a redirect
    pub requests_3xx: AtomicU64,
    pub requests_4xx: AtomicU64,
    pub requests_5xx: AtomicU64,
    pub request_duration_ms_total: AtomicU64,
    pub requests_in_flight: AtomicU64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_2xx: AtomicU64::new(0),
            requests_3xx: AtomicU64::new(0),
            requests_4xx: AtomicU64::new(0),
            requests_5xx: AtomicU64::new(0),
            request_duration_ms_total: AtomicU64::new(0),
            requests_in_flight: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_request(&self, status: StatusCode, duration_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.request_duration_ms_total.fetch_add(duration_ms, Ordering::Relaxed);

        let class = match status.as_u16() {
            200..=299 => &self.requests_2xx,
            300..=399 => &self.requests_3xx,
            400..=499 => &self.requests_4xx,
            500..=599 => &self.requests_5xx,
            _ => return,
        };
        class.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Prometheus text exposition
    pub fn export_prometheus(&self) -> String {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = writeln!(out, "# HELP http_requests_total Total number of HTTP requests");
        let _ = writeln!(out, "# TYPE http_requests_total counter");
        let _ = writeln!(out, "http_requests_total {}", load(&self.requests_total));

        let _ = writeln!(out, "# HELP http_requests_by_status HTTP requests by status code range");
        let _ = writeln!(out, "# TYPE http_requests_by_status counter");
        for (class, counter) in [
            ("2xx", &self.requests_2xx),
            ("3xx", &self.requests_3xx),
            ("4xx", &self.requests_4xx),
            ("5xx", &self.requests_5xx),
        ] {
            let _ = writeln!(out, "http_requests_by_status{{status=\"{class}\"}} {}", load(counter));
        }

        let _ = writeln!(
            out,
            "# HELP http_request_duration_ms_total Total HTTP request duration in milliseconds"
        );
        let _ = writeln!(out, "# TYPE http_request_duration_ms_total counter");
        let _ = writeln!(out, "http_request_duration_ms_total {}", load(&self.request_duration_ms_total));

        let _ = writeln!(out, "# HELP http_requests_in_flight Requests currently being served");
        let _ = writeln!(out, "# TYPE http_requests_in_flight gauge");
        let _ = writeln!(out, "http_requests_in_flight {}", load(&self.requests_in_flight));

        let _ = writeln!(out, "# HELP uptime_seconds Server uptime in seconds");
        let _ = writeln!(out, "# TYPE uptime_seconds gauge");
        let _ = writeln!(out, "uptime_seconds {}", self.uptime_seconds());

        out
    }
}

/// Counts every request passing through the router
pub async fn metrics_middleware(State(metrics): State<Arc<Metrics>>, request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    metrics.requests_in_flight.fetch_add(1, Ordering::Relaxed);
    let response = next.run(request).await;
    metrics.requests_in_flight.fetch_sub(1, Ordering::Relaxed);

    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let status = response.status();
    debug!(%method, %path, %status, duration_ms, "request completed");

    metrics.record_request(status, duration_ms);
    response
}

/// GET /metrics
pub async fn prometheus_metrics(State(metrics): State<Arc<Metrics>>) -> String {
    metrics.export_prometheus()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_request_by_class() {
        let metrics = Metrics::new();

        metrics.record_request(StatusCode::OK, 50);
        metrics.record_request(StatusCode::SEE_OTHER, 20);
        metrics.record_request(StatusCode::UNPROCESSABLE_ENTITY, 10);
        metrics.record_request(StatusCode::INTERNAL_SERVER_ERROR, 100);

        assert_eq!(metrics.requests_total.load(Ordering::Relaxed), 4);
        assert_eq!(metrics.requests_2xx.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.requests_3xx.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.requests_4xx.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.requests_5xx.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.request_duration_ms_total.load(Ordering::Relaxed), 180);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();
        metrics.record_request(StatusCode::SEE_OTHER, 5);

        let output = metrics.export_prometheus();
        assert!(output.contains("http_requests_total 1\n"));
        assert!(output.contains("http_requests_by_status{status=\"3xx\"} 1\n"));
        assert!(output.contains("http_requests_in_flight 0\n"));
        assert!(output.contains("uptime_seconds"));
    }
}
