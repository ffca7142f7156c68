//! In-memory component state store.

use async_trait::async_trait;
use dashmap::DashMap;
use ir_05_dispatcher::{DurableStore, StoreError};
use shared_types::{system_clock, MessageId, SharedClock};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Row count above which `upsert` purges expired rows.
pub const DEFAULT_PURGE_THRESHOLD: usize = 10_000;

const MIN_PURGE_GAP_SECS: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredComponent {
    pub blob: String,
    /// Epoch seconds, `0` for never.
    pub expiry: u64,
}

/// `DurableStore` backed by a concurrent map keyed by
/// `(message, component_key)`.
///
/// Expired rows are hidden from reads and dropped by [`purge_expired`],
/// which `upsert` also runs once the table passes its purge threshold.
///
/// [`purge_expired`]: InMemoryDurableStore::purge_expired
pub struct InMemoryDurableStore {
    rows: DashMap<(MessageId, String), StoredComponent>,
    purge_threshold: usize,
    last_purge_secs: AtomicU64,
    clock: SharedClock,
}

impl Default for InMemoryDurableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            rows: DashMap::new(),
            purge_threshold: DEFAULT_PURGE_THRESHOLD,
            last_purge_secs: AtomicU64::new(0),
            clock,
        }
    }

    pub fn with_purge_threshold(mut self, threshold: usize) -> Self {
        self.purge_threshold = threshold;
        self
    }

    pub fn get(&self, message: &MessageId, component_key: &str) -> Option<StoredComponent> {
        let row = self.rows.get(&(message.clone(), component_key.to_string()))?;
        if self.is_expired(&row) {
            return None;
        }
        Some(row.clone())
    }

    /// Live components on one message.
    pub fn components_on(&self, message: &MessageId) -> Vec<(String, StoredComponent)> {
        self.rows
            .iter()
            .filter(|row| &row.key().0 == message && !self.is_expired(row.value()))
            .map(|row| (row.key().1.clone(), row.value().clone()))
            .collect()
    }

    /// Number of rows, expired ones included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop expired rows, returning how many went.
    pub fn purge_expired(&self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, row| !self.is_expired(row));
        self.last_purge_secs.store(self.clock.now_secs(), Ordering::Relaxed);
        before.saturating_sub(self.rows.len())
    }

    fn purge_if_oversized(&self) {
        if self.rows.len() <= self.purge_threshold {
            return;
        }
        let now = self.clock.now_secs();
        if now.saturating_sub(self.last_purge_secs.load(Ordering::Relaxed)) < MIN_PURGE_GAP_SECS {
            return;
        }
        let purged = self.purge_expired();
        debug!(purged, remaining = self.rows.len(), "Expired components purged");
    }

    fn is_expired(&self, row: &StoredComponent) -> bool {
        row.expiry != 0 && row.expiry < self.clock.now_secs()
    }
}

#[async_trait]
impl DurableStore for InMemoryDurableStore {
    async fn upsert(
        &self,
        message: &MessageId,
        component_key: &str,
        blob: &str,
        expiry: u64,
    ) -> Result<(), StoreError> {
        if component_key.is_empty() {
            return Err(StoreError::Rejected("empty component key".to_string()));
        }
        self.purge_if_oversized();
        self.rows.insert(
            (message.clone(), component_key.to_string()),
            StoredComponent {
                blob: blob.to_string(),
                expiry,
            },
        );
        debug!(message = %message, component_key = component_key, "Component state stored");
        Ok(())
    }
}
