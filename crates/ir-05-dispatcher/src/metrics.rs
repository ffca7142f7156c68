//! Metrics hooks for dispatch outcomes
//!
//! The dispatcher keeps its own counters for [`RouterStats`]; this trait lets
//! a host mirror them into an external system such as Prometheus.
//!
//! [`RouterStats`]: ir_04_handler_registry::RouterStats

use std::time::Duration;

/// External metrics sink.
pub trait DispatchMetrics: Send + Sync {
    /// One call per dispatch; `reason` is `"success"` or a failure tag.
    fn record_outcome(&self, reason: &str);

    /// A handler finished successfully.
    fn record_execution(&self, kind: &str, route: &str, latency: Duration);
}

/// No-op recorder for when metrics are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpMetrics;

impl DispatchMetrics for NoOpMetrics {
    fn record_outcome(&self, _reason: &str) {}

    fn record_execution(&self, _kind: &str, _route: &str, _latency: Duration) {}
}
