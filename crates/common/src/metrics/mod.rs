//! Metrics and observability utilities
//!
//! Prometheus metrics for upstream calls, search fallbacks, chat requests
//! and seva joins. The recorder itself is installed by the gateway binary;
//! without one every helper here is a no-op.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Sangat metrics
pub const METRICS_PREFIX: &str = "sangat";

/// Histogram buckets for upstream call latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
    30.00, // 30s - generative timeout
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_upstream_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total upstream HTTP calls by service, endpoint and outcome"
    );

    describe_histogram!(
        format!("{}_upstream_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Upstream call latency in seconds"
    );

    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total search proxy lookups by path and answering variant"
    );

    describe_counter!(
        format!("{}_search_fallbacks_total", METRICS_PREFIX),
        Unit::Count,
        "Transliteration searches that fell back to translation"
    );

    describe_counter!(
        format!("{}_chat_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total chat proxy requests by outcome"
    );

    describe_counter!(
        format!("{}_seva_joins_total", METRICS_PREFIX),
        Unit::Count,
        "Seva join attempts by outcome"
    );

    tracing::info!("Metrics registered");
}

/// Times a single upstream call
pub struct UpstreamTimer {
    start: Instant,
    service: &'static str,
    endpoint: &'static str,
}

impl UpstreamTimer {
    /// Start timing a call
    pub fn start(service: &'static str, endpoint: &'static str) -> Self {
        Self {
            start: Instant::now(),
            service,
            endpoint,
        }
    }

    /// Record call completion
    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed().as_secs_f64();
        let outcome = if success { "success" } else { "error" };

        counter!(
            format!("{}_upstream_requests_total", METRICS_PREFIX),
            "service" => self.service,
            "endpoint" => self.endpoint,
            "outcome" => outcome
        )
        .increment(1);

        histogram!(
            format!("{}_upstream_duration_seconds", METRICS_PREFIX),
            "service" => self.service,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record search metrics
pub fn record_search(path: &'static str, variant: &'static str, fell_back: bool) {
    counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        "path" => path,
        "variant" => variant
    )
    .increment(1);

    if fell_back {
        counter!(format!("{}_search_fallbacks_total", METRICS_PREFIX)).increment(1);
    }
}

/// Helper to record chat metrics
pub fn record_chat(success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!(
        format!("{}_chat_requests_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);
}

/// Helper to record seva join metrics
pub fn record_seva_join(outcome: &'static str) {
    counter!(
        format!("{}_seva_joins_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);
}
