//! Prometheus metrics for request latency and plant activity.
//!
//! This module provides metrics for:
//! - HTTP request latency and counts per route
//! - Live feed samples and raised alerts
//! - Live subscriber count
//! - Chat messages by intent
//! - Optimizer run latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::error::BackendError;
use crate::plant::LogLevel;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Feed samples counter metric name.
pub const METRIC_SAMPLES_GENERATED: &str = "plant_samples_generated_total";
/// Plant alerts counter metric name.
pub const METRIC_PLANT_ALERTS: &str = "plant_alerts_total";
/// Live subscribers gauge metric name.
pub const METRIC_LIVE_SUBSCRIBERS: &str = "live_subscribers";
/// Chat messages counter metric name.
pub const METRIC_CHAT_MESSAGES: &str = "chat_messages_total";
/// Optimizer latency metric name.
pub const METRIC_OPTIMIZER_LATENCY: &str = "optimizer_latency_ms";

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_recorder() -> Result<PrometheusHandle, BackendError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| BackendError::Metrics(e.to_string()))
}

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_counter!(METRIC_HTTP_REQUESTS, "Total number of HTTP requests served");
    describe_counter!(
        METRIC_SAMPLES_GENERATED,
        "Total number of KPI samples produced by the feed"
    );
    describe_counter!(
        METRIC_PLANT_ALERTS,
        "Total number of plant log entries raised by level"
    );
    describe_gauge!(
        METRIC_LIVE_SUBSCRIBERS,
        "Number of connected live data subscribers"
    );
    describe_counter!(METRIC_CHAT_MESSAGES, "Total number of chat messages by intent");
    describe_histogram!(
        METRIC_OPTIMIZER_LATENCY,
        "Setpoint optimization latency in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Record HTTP request latency and count.
pub fn record_http_request(start: Instant, route: &str, status: u16) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "route" => route.to_string()).record(latency_ms);
    counter!(
        METRIC_HTTP_REQUESTS,
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Increment feed samples counter.
pub fn inc_samples_generated() {
    counter!(METRIC_SAMPLES_GENERATED).increment(1);
}

/// Increment plant alerts counter.
pub fn inc_plant_alerts(level: LogLevel) {
    counter!(METRIC_PLANT_ALERTS, "level" => level.to_string()).increment(1);
}

/// Set live subscribers gauge.
pub fn set_live_subscribers(count: usize) {
    gauge!(METRIC_LIVE_SUBSCRIBERS).set(count as f64);
}

/// Increment chat messages counter.
pub fn inc_chat_messages(intent: &str) {
    counter!(METRIC_CHAT_MESSAGES, "intent" => intent.to_string()).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for optimizer runs.
pub fn timer_optimizer() -> LatencyTimer {
    LatencyTimer::new(METRIC_OPTIMIZER_LATENCY)
}
