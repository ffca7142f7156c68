//! Prometheus-backed dispatch metrics.

use ir_05_dispatcher::DispatchMetrics;
use std::time::Duration;

/// Mirrors dispatch outcomes into the `router-telemetry` registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetrics;

impl DispatchMetrics for PrometheusMetrics {
    fn record_outcome(&self, reason: &str) {
        router_telemetry::record_dispatch_outcome(reason);
    }

    fn record_execution(&self, kind: &str, route: &str, latency: Duration) {
        router_telemetry::record_handler_execution(kind, route, latency);
    }
}
