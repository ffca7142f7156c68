//! Prometheus metrics for the interaction router.
//!
//! Naming convention: `ir_<area>_<metric>_<unit>`.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

use crate::TelemetryError;

lazy_static! {
    /// Router metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Dispatch outcomes by reason (`success` or a failure tag)
    pub static ref DISPATCH_OUTCOMES: IntCounterVec = IntCounterVec::new(
        Opts::new("ir_dispatch_outcomes_total", "Dispatch outcomes by reason"),
        &["reason"]
    ).expect("metric creation failed");

    /// Successful handler executions by kind and route (`ns:action`)
    pub static ref HANDLER_EXECUTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("ir_handler_executions_total", "Successful handler executions"),
        &["kind", "route"]
    ).expect("metric creation failed");

    /// Handler latency by kind
    pub static ref HANDLER_LATENCY: HistogramVec = HistogramVec::new(
        HistogramOpts::new("ir_handler_duration_seconds", "Time spent inside handlers")
            .buckets(exponential_buckets(0.0005, 2.0, 14).expect("valid buckets")),
        &["kind"]
    ).expect("metric creation failed");
}

/// Register all metrics with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(DISPATCH_OUTCOMES.clone()),
        Box::new(HANDLER_EXECUTIONS.clone()),
        Box::new(HANDLER_LATENCY.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

pub fn record_dispatch_outcome(reason: &str) {
    DISPATCH_OUTCOMES.with_label_values(&[reason]).inc();
}

pub fn record_handler_execution(kind: &str, route: &str, latency: Duration) {
    HANDLER_EXECUTIONS.with_label_values(&[kind, route]).inc();
    HANDLER_LATENCY
        .with_label_values(&[kind])
        .observe(latency.as_secs_f64());
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
