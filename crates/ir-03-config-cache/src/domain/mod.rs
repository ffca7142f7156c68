//! Config cache domain types

use serde::{Deserialize, Serialize};
use shared_types::TenantId;
use std::time::Duration;

/// How long a loaded config is served before it is fetched again.
pub const DEFAULT_CONFIG_TTL: Duration = Duration::from_secs(300);

/// Configuration document for one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig {
    pub tenant: TenantId,
    pub data: serde_json::Value,
}

impl TenantConfig {
    pub fn new(tenant: TenantId, data: serde_json::Value) -> Self {
        Self { tenant, data }
    }

    /// Top-level field lookup.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Top-level boolean flag; missing or non-boolean reads as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(serde_json::Value::as_bool).unwrap_or(false)
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Loads actually sent to the source.
    pub fetches: u64,
    /// Misses that joined an in-flight load instead of starting one.
    pub coalesced: u64,
    pub invalidations: u64,
    pub entries: usize,
}
