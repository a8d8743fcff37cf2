//! Prometheus exporter setup

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use sangat_common::{config::ObservabilityConfig, metrics::LATENCY_BUCKETS};

/// Exporter builder with latency buckets and a `service` label on every series
pub fn prometheus_builder(config: &ObservabilityConfig) -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .add_global_label("service", config.service_name.clone())
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sangat_common::metrics::UpstreamTimer;

    #[test]
    fn test_series_carry_service_label() {
        let mut config = ObservabilityConfig::default();
        config.service_name = "sangat-test".to_string();

        let recorder = prometheus_builder(&config).unwrap().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            UpstreamTimer::start("gurbani", "ang").finish(true);
        });

        let rendered = handle.render();
        assert!(rendered.contains("sangat_upstream_requests_total"));
        assert!(rendered.contains("service=\"sangat-test\""));
        assert!(rendered.contains("sangat_upstream_duration_seconds_bucket"));
    }
}
