//! Router statistics snapshot

use serde::Serialize;
use std::collections::BTreeMap;

/// Counters exposed through [`RouterHandle::stats`](crate::RouterHandle::stats).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouterStats {
    /// Registered handlers per interaction kind (exact keys plus patterns).
    pub handler_counts: BTreeMap<String, usize>,
    /// Successful executions keyed `kind:ns:action`.
    pub execution_counts: BTreeMap<String, u64>,
    /// Denials keyed by reason tag.
    pub denial_counts: BTreeMap<String, u64>,
    /// Handler and router failures.
    pub error_count: u64,
    /// Mean handler latency over successful executions.
    pub mean_execution_latency_us: u64,
}

impl RouterStats {
    pub fn total_executions(&self) -> u64 {
        self.execution_counts.values().sum()
    }

    pub fn denials(&self, reason: &str) -> u64 {
        self.denial_counts.get(reason).copied().unwrap_or(0)
    }
}
