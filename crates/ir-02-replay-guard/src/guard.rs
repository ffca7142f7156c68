//! # Time-Bounded Replay Table

use parking_lot::Mutex;
use serde::Serialize;
use shared_types::{system_clock, SharedClock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Default table size before a size-triggered sweep.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Default interval between time-triggered sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Size-triggered sweeps run at most this often, so a table full of live
/// entries is not rescanned on every check.
const MIN_SWEEP_GAP_MS: u64 = 1_000;

/// Replay guard configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayGuardConfig {
    pub max_entries: usize,
    pub sweep_interval: Duration,
}

impl ReplayGuardConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_entries == 0 {
            return Err("max_entries must be positive");
        }
        if self.sweep_interval.is_zero() {
            return Err("sweep_interval must be positive");
        }
        Ok(())
    }
}

impl Default for ReplayGuardConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Point-in-time guard statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub checked: u64,
    pub rejected: u64,
    pub swept: u64,
    pub entries: usize,
}

struct ReplayTable {
    /// key -> expiry (epoch ms)
    entries: HashMap<String, u64>,
    last_sweep_ms: u64,
}

/// Single-use tracker keyed by scoped replay keys.
pub struct ReplayGuard {
    table: Mutex<ReplayTable>,
    config: ReplayGuardConfig,
    clock: SharedClock,
    checked: AtomicU64,
    rejected: AtomicU64,
    swept: AtomicU64,
}

impl ReplayGuard {
    /// Create a guard with default settings.
    pub fn new() -> Self {
        Self::with_config(ReplayGuardConfig::default(), system_clock())
    }

    /// Create a guard with custom settings and clock.
    pub fn with_config(config: ReplayGuardConfig, clock: SharedClock) -> Self {
        let now = clock.now_millis();
        Self {
            table: Mutex::new(ReplayTable {
                entries: HashMap::new(),
                last_sweep_ms: now,
            }),
            config,
            clock,
            checked: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            swept: AtomicU64::new(0),
        }
    }

    /// Returns `true` the first time `key` is seen within `ttl`, `false` on
    /// every later call until the entry expires.
    pub fn check(&self, key: &str, ttl: Duration) -> bool {
        let now = self.clock.now_millis();
        self.checked.fetch_add(1, Ordering::Relaxed);

        let mut table = self.table.lock();
        self.maybe_sweep(&mut table, now);

        if let Some(&expiry) = table.entries.get(key) {
            if expiry > now {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        }

        let expiry = now.saturating_add(ttl.as_millis() as u64);
        table.entries.insert(key.to_string(), expiry);
        true
    }

    /// Number of tracked keys (expired ones included until swept).
    pub fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ReplayStats {
        ReplayStats {
            checked: self.checked.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            swept: self.swept.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn maybe_sweep(&self, table: &mut ReplayTable, now: u64) {
        let since_sweep = now.saturating_sub(table.last_sweep_ms);
        let over_size =
            table.entries.len() > self.config.max_entries && since_sweep >= MIN_SWEEP_GAP_MS;
        let overdue = since_sweep >= self.config.sweep_interval.as_millis() as u64;

        if over_size || overdue {
            let removed = self.sweep(table, now);
            table.last_sweep_ms = now;
            self.swept.fetch_add(removed as u64, Ordering::Relaxed);
            debug!(
                removed = removed,
                remaining = table.entries.len(),
                over_size = over_size,
                "Replay table swept"
            );
        }
    }

    /// Remove expired entries, stopping once the table is under half its cap.
    fn sweep(&self, table: &mut ReplayTable, now: u64) -> usize {
        let before = table.entries.len();
        let low_water = self.config.max_entries / 2;

        if before < low_water {
            // Already small: a full pass is cheap.
            table.entries.retain(|_, expiry| *expiry > now);
            return before - table.entries.len();
        }

        let budget = before - low_water + 1;
        let expired: Vec<String> = table
            .entries
            .iter()
            .filter(|(_, expiry)| **expiry <= now)
            .map(|(key, _)| key.clone())
            .take(budget)
            .collect();

        for key in &expired {
            table.entries.remove(key);
        }
        expired.len()
    }
}

impl Default for ReplayGuard {
    fn default() -> Self {
        Self::new()
    }
}
