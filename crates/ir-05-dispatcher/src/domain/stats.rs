//! In-process dispatch counters

use dashmap::DashMap;
use ir_04_handler_registry::RouterStats;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free counters behind [`RouterStats`].
#[derive(Debug, Default)]
pub struct StatsCollector {
    executions: DashMap<String, u64>,
    denials: DashMap<&'static str, u64>,
    errors: AtomicU64,
    executions_total: AtomicU64,
    latency_us_total: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// `key` is `kind:ns:action`.
    pub fn record_execution(&self, key: String, latency: Duration) {
        *self.executions.entry(key).or_insert(0) += 1;
        self.executions_total.fetch_add(1, Ordering::Relaxed);
        self.latency_us_total
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_denial(&self, reason: &'static str) {
        *self.denials.entry(reason).or_insert(0) += 1;
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, handler_counts: BTreeMap<String, usize>) -> RouterStats {
        let executions_total = self.executions_total.load(Ordering::Relaxed);
        let mean_execution_latency_us = if executions_total > 0 {
            self.latency_us_total.load(Ordering::Relaxed) / executions_total
        } else {
            0
        };

        RouterStats {
            handler_counts,
            execution_counts: self
                .executions
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
            denial_counts: self
                .denials
                .iter()
                .map(|entry| (entry.key().to_string(), *entry.value()))
                .collect(),
            error_count: self.errors.load(Ordering::Relaxed),
            mean_execution_latency_us,
        }
    }
}
